//! Per-file evaluation context.

use std::collections::BTreeMap;

use crate::entities::{Fact, FileId};

/// All facts of one file, the unit a [`Matcher`](super::Matcher) evaluates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFacts {
    file: FileId,
    facts: Vec<Fact>,
}

impl FileFacts {
    pub fn new(file: FileId, facts: Vec<Fact>) -> Self {
        Self { file, facts }
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    pub fn facts(&self) -> &[Fact] {
        self.facts.as_slice()
    }
}

/// Groups facts by file, ordered by file id.
///
/// Facts are re-homed by their own `file` field; input order is irrelevant.
pub fn group_by_file(facts: impl IntoIterator<Item = Fact>) -> Vec<FileFacts> {
    let mut grouped: BTreeMap<FileId, Vec<Fact>> = BTreeMap::new();
    for fact in facts {
        grouped.entry(fact.file).or_default().push(fact);
    }
    grouped
        .into_iter()
        .map(|(file, facts)| FileFacts::new(file, facts))
        .collect()
}
