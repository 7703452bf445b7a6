//! In-memory store implementing every store trait.

use std::collections::{BTreeMap, BTreeSet};

use fnv::FnvHashMap;
use parking_lot::RwLock;

use crate::entities::{Fact, Implication, Tag, TagId, Value, ValueId};
use crate::error::{FiletagError, Result};
use crate::implication::ImplicationGraph;

use super::filter::FactFilter;
use super::traits::{Catalog, FactStore, ImplicationSource};

#[derive(Debug, Default)]
struct StoreData {
    tags: BTreeMap<TagId, Tag>,
    tag_names: FnvHashMap<String, TagId>,
    values: BTreeMap<ValueId, Value>,
    value_names: FnvHashMap<String, ValueId>,
    facts: BTreeSet<Fact>,
    implications: BTreeSet<Implication>,
    next_tag: u32,
    next_value: u32,
}

impl StoreData {
    fn select<'a>(&'a self, filter: &'a FactFilter) -> impl Iterator<Item = &'a Fact> + 'a {
        // Facts are ordered by file first, so a file constraint is a range scan.
        let range = match filter.file {
            Some(file) => self.facts.range(Fact::new(file, TagId(0), None)..),
            None => self.facts.range(..),
        };
        range
            .take_while(move |fact| filter.file.map_or(true, |file| fact.file == file))
            .filter(move |fact| filter.matches(fact))
    }
}

/// Thread-safe in-memory fact store, catalog and implication table.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tag with this name, creating it if needed.
    pub fn create_tag(&self, name: &str) -> Result<Tag> {
        validate_name("tag", name)?;
        let mut data = self.data.write();
        if let Some(id) = data.tag_names.get(name).copied() {
            return tag_for(&data, id);
        }
        data.next_tag += 1;
        let tag = Tag {
            id: TagId(data.next_tag),
            name: name.to_string(),
        };
        data.tag_names.insert(tag.name.clone(), tag.id);
        data.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    /// Returns the value with this name, creating it if needed.
    pub fn create_value(&self, name: &str) -> Result<Value> {
        validate_name("value", name)?;
        let mut data = self.data.write();
        if let Some(id) = data.value_names.get(name).copied() {
            return value_for(&data, id);
        }
        data.next_value += 1;
        let value = Value {
            id: ValueId(data.next_value),
            name: name.to_string(),
        };
        data.value_names.insert(value.name.clone(), value.id);
        data.values.insert(value.id, value.clone());
        Ok(value)
    }

    /// Returns whether the rule was newly added.
    pub fn add_implication(&self, implication: Implication) -> Result<bool> {
        let mut data = self.data.write();
        ensure_tag(&data, implication.source.tag)?;
        ensure_tag(&data, implication.implied.tag)?;
        for value in [implication.source.value, implication.implied.value]
            .into_iter()
            .filter_map(|selector| selector.exact_id())
        {
            if !data.values.contains_key(&value) {
                return Err(FiletagError::InvalidInput(format!(
                    "implication references unknown value {value}"
                )));
            }
        }
        Ok(data.implications.insert(implication))
    }

    /// Returns whether the rule existed.
    pub fn remove_implication(&self, implication: &Implication) -> bool {
        self.data.write().implications.remove(implication)
    }

    /// Snapshot of the current implication rules.
    pub fn implication_graph(&self) -> ImplicationGraph {
        ImplicationGraph::new(self.data.read().implications.iter().copied())
    }
}

impl FactStore for MemoryStore {
    fn find_facts(&self, filter: &FactFilter) -> Result<Vec<Fact>> {
        let data = self.data.read();
        Ok(data.select(filter).copied().collect())
    }

    fn fact_count(&self, filter: &FactFilter) -> Result<usize> {
        let data = self.data.read();
        Ok(data.select(filter).count())
    }

    fn insert_fact_if_absent(&self, fact: Fact) -> Result<bool> {
        let mut data = self.data.write();
        ensure_tag(&data, fact.tag)?;
        if let Some(value) = fact.value {
            if !data.values.contains_key(&value) {
                return Err(FiletagError::InvalidInput(format!(
                    "fact references unknown value {value}"
                )));
            }
        }
        Ok(data.facts.insert(fact))
    }

    fn delete_facts(&self, filter: &FactFilter) -> Result<usize> {
        let mut data = self.data.write();
        let doomed = data.select(filter).copied().collect::<Vec<_>>();
        for fact in &doomed {
            data.facts.remove(fact);
        }
        Ok(doomed.len())
    }
}

impl Catalog for MemoryStore {
    fn tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let data = self.data.read();
        Ok(data
            .tag_names
            .get(name)
            .and_then(|id| data.tags.get(id))
            .cloned())
    }

    fn value_by_name(&self, name: &str) -> Result<Option<Value>> {
        let data = self.data.read();
        Ok(data
            .value_names
            .get(name)
            .and_then(|id| data.values.get(id))
            .cloned())
    }

    fn tag(&self, id: TagId) -> Result<Option<Tag>> {
        Ok(self.data.read().tags.get(&id).cloned())
    }

    fn value(&self, id: ValueId) -> Result<Option<Value>> {
        Ok(self.data.read().values.get(&id).cloned())
    }

    fn values(&self) -> Result<Vec<Value>> {
        Ok(self.data.read().values.values().cloned().collect())
    }
}

impl ImplicationSource for MemoryStore {
    fn implications(&self) -> Result<Vec<Implication>> {
        Ok(self.data.read().implications.iter().copied().collect())
    }
}

fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FiletagError::InvalidInput(format!(
            "{kind} name must not be empty"
        )));
    }
    Ok(())
}

fn ensure_tag(data: &StoreData, id: TagId) -> Result<()> {
    if data.tags.contains_key(&id) {
        Ok(())
    } else {
        Err(FiletagError::InvalidInput(format!("unknown tag {id}")))
    }
}

fn tag_for(data: &StoreData, id: TagId) -> Result<Tag> {
    data.tags
        .get(&id)
        .cloned()
        .ok_or_else(|| FiletagError::Storage(format!("tag index out of sync for {id}")))
}

fn value_for(data: &StoreData, id: ValueId) -> Result<Value> {
    data.values
        .get(&id)
        .cloned()
        .ok_or_else(|| FiletagError::Storage(format!("value index out of sync for {id}")))
}
