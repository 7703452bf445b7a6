//! Query expression types and AST nodes.

use std::fmt;

use super::comparison::ComparisonOp;

/// A parsed query expression (AST node).
///
/// There is no disjunction or negation node; `!=` is the only negative form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryExpression {
    /// Matches every file.
    Empty,
    /// The tag, or anything implying it, is present with any value.
    TagPresence { name: String },
    /// Any value of the tag, or any value of a tag implying it.
    AllValues { name: String },
    /// The tag carries a value satisfying `op` against the literal.
    Comparison {
        tag: String,
        value: String,
        op: ComparisonOp,
    },
    And(Box<QueryExpression>, Box<QueryExpression>),
}

impl QueryExpression {
    pub fn tag(name: impl Into<String>) -> Self {
        Self::TagPresence { name: name.into() }
    }

    pub fn all_values(name: impl Into<String>) -> Self {
        Self::AllValues { name: name.into() }
    }

    pub fn comparison(tag: impl Into<String>, op: ComparisonOp, value: impl Into<String>) -> Self {
        Self::Comparison {
            tag: tag.into(),
            value: value.into(),
            op,
        }
    }

    pub fn and(left: Self, right: Self) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    /// Left-nested conjunction of `parts`; `Empty` when there are none.
    pub fn and_all(parts: impl IntoIterator<Item = Self>) -> Self {
        parts
            .into_iter()
            .reduce(Self::and)
            .unwrap_or(Self::Empty)
    }
}

impl fmt::Display for QueryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::TagPresence { name } => write!(f, "{name}"),
            Self::AllValues { name } => write!(f, "{name}=*"),
            Self::Comparison { tag, value, op } => write!(f, "{tag} {op} {value}"),
            Self::And(left, right) => match (left.as_ref(), right.as_ref()) {
                (Self::Empty, other) | (other, Self::Empty) => write!(f, "{other}"),
                _ => write!(f, "({left} and {right})"),
            },
        }
    }
}
