//! Store traits consumed by the query core.

use crate::entities::{Fact, Implication, Tag, TagId, Value, ValueId};
use crate::error::{FiletagError, Result};

use super::filter::FactFilter;

/// The (file, tag, value) relation.
pub trait FactStore: Send + Sync {
    fn find_facts(&self, filter: &FactFilter) -> Result<Vec<Fact>>;

    fn fact_count(&self, filter: &FactFilter) -> Result<usize>;

    /// Inserts the fact unless the same triple is already present.
    ///
    /// Returns whether a new fact was stored.
    fn insert_fact_if_absent(&self, fact: Fact) -> Result<bool>;

    /// Removes every matching fact and returns how many were removed.
    fn delete_facts(&self, filter: &FactFilter) -> Result<usize>;

    fn fact_exists(&self, fact: &Fact) -> Result<bool> {
        Ok(self.fact_count(&FactFilter::exact(fact))? > 0)
    }

    /// Removes exactly one fact, failing if it was not present.
    fn delete_fact(&self, fact: &Fact) -> Result<()> {
        match self.delete_facts(&FactFilter::exact(fact))? {
            0 => Err(FiletagError::NoSuchFact {
                file: fact.file,
                tag: fact.tag,
                value: fact.value,
            }),
            _ => Ok(()),
        }
    }

    /// Applies `dest` to every file/value that currently carries `source`.
    ///
    /// Returns the number of facts added.
    fn copy_facts(&self, source: TagId, dest: TagId) -> Result<usize> {
        let mut copied = 0;
        for fact in self.find_facts(&FactFilter::tag(source))? {
            if self.insert_fact_if_absent(Fact::new(fact.file, dest, fact.value))? {
                copied += 1;
            }
        }
        Ok(copied)
    }
}

/// Tag and value name resolution.
pub trait Catalog: Send + Sync {
    fn tag_by_name(&self, name: &str) -> Result<Option<Tag>>;

    fn value_by_name(&self, name: &str) -> Result<Option<Value>>;

    fn tag(&self, id: TagId) -> Result<Option<Tag>>;

    fn value(&self, id: ValueId) -> Result<Option<Value>>;

    /// Every known value, used to evaluate ordered comparisons.
    fn values(&self) -> Result<Vec<Value>>;
}

/// Read access to the implication rules.
pub trait ImplicationSource: Send + Sync {
    fn implications(&self) -> Result<Vec<Implication>>;
}
