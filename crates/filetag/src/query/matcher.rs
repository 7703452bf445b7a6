//! Compiled query matchers.

use fnv::FnvHashSet;
use rayon::prelude::*;

use crate::entities::{Fact, TagId};
use crate::implication::ClosureSet;

use super::context::FileFacts;

/// Predicate over a single fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactPredicate {
    /// The fact's (tag, value) is covered by the closure set.
    InClosure(ClosureSet),
    /// The fact's tag is in the set, whatever its value.
    TagIn(FnvHashSet<TagId>),
    /// The fact is covered by `family` but not by `excluded`.
    OutsideClosure {
        family: ClosureSet,
        excluded: ClosureSet,
    },
}

impl FactPredicate {
    pub fn accepts(&self, fact: &Fact) -> bool {
        match self {
            Self::InClosure(closure) => closure.accepts(fact),
            Self::TagIn(tags) => tags.contains(&fact.tag),
            Self::OutsideClosure { family, excluded } => {
                family.accepts(fact) && !excluded.accepts(fact)
            }
        }
    }

    /// Tags at least one of which an accepted fact must carry.
    pub fn candidate_tags(&self) -> FnvHashSet<TagId> {
        match self {
            Self::InClosure(closure) => closure.tags(),
            Self::TagIn(tags) => tags.clone(),
            Self::OutsideClosure { family, .. } => family.tags(),
        }
    }
}

/// A compiled query, evaluated against the facts of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    Always,
    /// Some fact of the file satisfies the predicate.
    Any(FactPredicate),
    And(Box<Matcher>, Box<Matcher>),
}

impl Matcher {
    pub fn and(left: Self, right: Self) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn matches_file(&self, file: &FileFacts) -> bool {
        self.matches_facts(file.facts())
    }

    pub fn matches_facts(&self, facts: &[Fact]) -> bool {
        match self {
            Self::Always => true,
            Self::Any(predicate) => facts.iter().any(|fact| predicate.accepts(fact)),
            Self::And(left, right) => left.matches_facts(facts) && right.matches_facts(facts),
        }
    }

    /// A tag set that every matching file must intersect, if one exists.
    ///
    /// For a conjunction either side's set is a valid restriction; the smaller
    /// one is returned.
    pub fn candidate_tags(&self) -> Option<FnvHashSet<TagId>> {
        match self {
            Self::Always => None,
            Self::Any(predicate) => Some(predicate.candidate_tags()),
            Self::And(left, right) => match (left.candidate_tags(), right.candidate_tags()) {
                (Some(left), Some(right)) => Some(if right.len() < left.len() {
                    right
                } else {
                    left
                }),
                (left, right) => left.or(right),
            },
        }
    }

    /// Files accepted by the matcher, in input order.
    ///
    /// Evaluation fans out over rayon once `files` reaches `parallel_threshold`.
    pub fn select<'a>(&self, files: &'a [FileFacts], parallel_threshold: usize) -> Vec<&'a FileFacts> {
        if files.len() >= parallel_threshold {
            files
                .par_iter()
                .filter(|file| self.matches_file(file))
                .collect()
        } else {
            files.iter().filter(|file| self.matches_file(file)).collect()
        }
    }
}
