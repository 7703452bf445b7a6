//! Core entity types shared by the store, the implication graph and the
//! query compiler.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle of a tracked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TagId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValueId(pub u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Value {
    pub id: ValueId,
    pub name: String,
}

/// One (file, tag, value) association.
///
/// `value` is `None` when the tag was applied without a value. This is not
/// the same thing as [`ValueSelector::Any`], which only appears in
/// implication rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fact {
    pub file: FileId,
    pub tag: TagId,
    pub value: Option<ValueId>,
}

impl Fact {
    pub fn new(file: FileId, tag: TagId, value: Option<ValueId>) -> Self {
        Self { file, tag, value }
    }

    /// The (tag, value) half of the fact as a closure pair.
    ///
    /// A fact without a value seeds closures as "any value of the tag", which
    /// is what makes wildcard-sourced rules apply to it.
    pub fn tag_value(&self) -> TagValue {
        match self.value {
            Some(value) => TagValue::exact(self.tag, value),
            None => TagValue::any(self.tag),
        }
    }
}

/// Value component of an implication endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSelector {
    /// Any value of the tag, including none.
    Any,
    Exact(ValueId),
}

impl ValueSelector {
    pub fn exact_id(self) -> Option<ValueId> {
        match self {
            Self::Any => None,
            Self::Exact(id) => Some(id),
        }
    }
}

/// A (tag, value selector) pair: the unit of closure computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TagValue {
    pub tag: TagId,
    pub value: ValueSelector,
}

impl TagValue {
    pub fn any(tag: TagId) -> Self {
        Self {
            tag,
            value: ValueSelector::Any,
        }
    }

    pub fn exact(tag: TagId, value: ValueId) -> Self {
        Self {
            tag,
            value: ValueSelector::Exact(value),
        }
    }
}

/// Rule stating that `source` implies `implied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Implication {
    pub source: TagValue,
    pub implied: TagValue,
}

impl Implication {
    pub fn new(source: TagValue, implied: TagValue) -> Self {
        Self { source, implied }
    }
}

/// A resolved (tag, value) combination returned by listing queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagValuePair {
    pub tag: Tag,
    pub value: Option<Value>,
}

impl TagValuePair {
    /// Value name, or the empty string when the pair carries no value.
    pub fn value_name(&self) -> &str {
        self.value.as_ref().map_or("", |value| value.name.as_str())
    }

    pub fn sort_key(&self) -> (&str, &str) {
        (self.tag.name.as_str(), self.value_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valueless_fact_seeds_wildcard() {
        let fact = Fact::new(FileId(1), TagId(2), None);
        assert_eq!(fact.tag_value(), TagValue::any(TagId(2)));

        let fact = Fact::new(FileId(1), TagId(2), Some(ValueId(3)));
        assert_eq!(fact.tag_value(), TagValue::exact(TagId(2), ValueId(3)));
    }

    #[test]
    fn empty_value_name_for_valueless_pair() {
        let pair = TagValuePair {
            tag: Tag {
                id: TagId(1),
                name: "music".to_string(),
            },
            value: None,
        };
        assert_eq!(pair.value_name(), "");
        assert_eq!(pair.sort_key(), ("music", ""));
    }
}
