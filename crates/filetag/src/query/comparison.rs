//! Comparison operators and value ordering.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{FiletagError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl ComparisonOp {
    /// Parses an operator token. `=` is accepted as a synonym for `==`.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "==" | "=" => Ok(Self::Eq),
            "!=" => Ok(Self::Ne),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Lte),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Gte),
            _ => Err(FiletagError::QueryParse(format!(
                "unknown comparison operator: {raw}"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }

    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Lte => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Gte => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compares stored value names against a query literal.
///
/// When the literal is numeric, stored names that also parse as numbers are
/// compared as `f64`. Anything else falls back to byte-wise text ordering.
/// NaN is not a number here, so a value named "NaN" orders as text.
#[derive(Debug, Clone)]
pub struct ValueComparator {
    literal: String,
    numeric: Option<f64>,
}

impl ValueComparator {
    pub fn new(literal: &str) -> Self {
        Self {
            literal: literal.to_string(),
            numeric: parse_number(literal),
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric.is_some()
    }

    /// Ordering of `stored` relative to the literal.
    pub fn compare(&self, stored: &str) -> Ordering {
        if let (Some(literal), Some(number)) = (self.numeric, parse_number(stored)) {
            if let Some(ordering) = number.partial_cmp(&literal) {
                return ordering;
            }
        }
        stored.cmp(self.literal.as_str())
    }

    /// Whether `stored op literal` holds.
    pub fn matches(&self, op: ComparisonOp, stored: &str) -> bool {
        op.holds(self.compare(stored))
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|number| !number.is_nan())
}
