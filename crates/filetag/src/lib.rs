//! Tag query compilation and implication closure for a tag-based file store.
//!
//! This crate provides the query core of a file tagger:
//! - Tag/value implication graph with forward and reverse closure
//! - Query parsing and compilation into per-file matchers
//! - Projection of matches into file ids or (tag, value) listings
//! - Store traits plus an in-memory store

pub mod config;
pub mod engine;
pub mod entities;
pub mod error;
pub mod implication;
pub mod projection;
pub mod query;
pub mod store;

// Re-export main types
pub use config::EngineConfig;
pub use engine::{CompiledQuery, Projection, QueryEngine, QueryOutput};
pub use entities::{
    Fact, FileId, Implication, Tag, TagId, TagValue, TagValuePair, Value, ValueId, ValueSelector,
};
pub use error::{FiletagError, Result};
pub use implication::{ClosureSet, ImplicationGraph};
pub use projection::ResultProjector;
pub use query::{ComparisonOp, Matcher, QueryExpression, QueryParser};
pub use store::{Catalog, FactFilter, FactStore, ImplicationSource, MemoryStore};
