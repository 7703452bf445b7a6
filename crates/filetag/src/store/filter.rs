//! Equality filters over the fact relation.

use crate::entities::{Fact, FileId, TagId, ValueId};

/// Conjunction of optional equality constraints on a fact's columns.
///
/// `value: Some(None)` selects facts carrying no value; `value: None` leaves
/// the value column unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FactFilter {
    pub file: Option<FileId>,
    pub tag: Option<TagId>,
    pub value: Option<Option<ValueId>>,
}

impl FactFilter {
    /// Matches every fact.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn file(file: FileId) -> Self {
        Self::all().with_file(file)
    }

    pub fn tag(tag: TagId) -> Self {
        Self::all().with_tag(tag)
    }

    pub fn value(value: ValueId) -> Self {
        Self::all().with_value(Some(value))
    }

    /// Matches exactly one triple.
    pub fn exact(fact: &Fact) -> Self {
        Self::file(fact.file)
            .with_tag(fact.tag)
            .with_value(fact.value)
    }

    pub fn with_file(mut self, file: FileId) -> Self {
        self.file = Some(file);
        self
    }

    pub fn with_tag(mut self, tag: TagId) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn with_value(mut self, value: Option<ValueId>) -> Self {
        self.value = Some(value);
        self
    }

    pub fn matches(&self, fact: &Fact) -> bool {
        self.file.map_or(true, |file| file == fact.file)
            && self.tag.map_or(true, |tag| tag == fact.tag)
            && self.value.map_or(true, |value| value == fact.value)
    }
}
