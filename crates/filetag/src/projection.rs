//! Result projection: turning matched files into caller-facing shapes.

use std::collections::BTreeSet;

use fnv::FnvHashSet;

use crate::config::DEFAULT_PARALLEL_THRESHOLD;
use crate::entities::{FileId, TagId, TagValuePair, ValueId};
use crate::error::{FiletagError, Result};
use crate::implication::ImplicationGraph;
use crate::query::{FileFacts, Matcher};
use crate::store::Catalog;

/// Projects the files accepted by a matcher.
#[derive(Debug, Clone, Copy)]
pub struct ResultProjector<'a> {
    matcher: &'a Matcher,
    parallel_threshold: usize,
}

impl<'a> ResultProjector<'a> {
    pub fn new(matcher: &'a Matcher) -> Self {
        Self {
            matcher,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Distinct ids of the files with at least one accepted fact set.
    pub fn matching_files(&self, files: &[FileFacts]) -> BTreeSet<FileId> {
        self.matcher
            .select(files, self.parallel_threshold)
            .into_iter()
            .map(FileFacts::file)
            .collect()
    }

    /// Distinct (tag, value) pairs carried by the matching files.
    ///
    /// Sorted by tag name, then value name, with the empty value name first.
    /// With `implied` set, each fact also contributes everything it implies;
    /// wildcard entries are listed without a value.
    pub fn matching_tag_value_pairs(
        &self,
        files: &[FileFacts],
        catalog: &dyn Catalog,
        implied: Option<&ImplicationGraph>,
    ) -> Result<Vec<TagValuePair>> {
        let mut keys: FnvHashSet<(TagId, Option<ValueId>)> = FnvHashSet::default();

        for file in self.matcher.select(files, self.parallel_threshold) {
            for fact in file.facts() {
                keys.insert((fact.tag, fact.value));
                if let Some(graph) = implied {
                    keys.extend(
                        graph
                            .closure(fact.tag_value())
                            .iter()
                            .map(|pair| (pair.tag, pair.value.exact_id())),
                    );
                }
            }
        }

        let mut pairs = keys
            .into_iter()
            .map(|(tag, value)| resolve_pair(catalog, tag, value))
            .collect::<Result<Vec<_>>>()?;
        pairs.sort_by(|left, right| left.sort_key().cmp(&right.sort_key()));
        Ok(pairs)
    }
}

fn resolve_pair(catalog: &dyn Catalog, tag: TagId, value: Option<ValueId>) -> Result<TagValuePair> {
    let tag = catalog
        .tag(tag)?
        .ok_or_else(|| FiletagError::Storage(format!("fact references missing tag {tag}")))?;
    let value = match value {
        Some(id) => Some(
            catalog
                .value(id)?
                .ok_or_else(|| FiletagError::Storage(format!("fact references missing value {id}")))?,
        ),
        None => None,
    };
    Ok(TagValuePair { tag, value })
}
