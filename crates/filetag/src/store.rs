//! Fact store collaborator.
//!
//! The query core only reads through these traits. [`MemoryStore`] is the
//! in-process implementation used by the engine tests and by embedders that
//! do not bring their own storage.

mod filter;
mod memory;
mod traits;

pub use filter::FactFilter;
pub use memory::MemoryStore;
pub use traits::{Catalog, FactStore, ImplicationSource};
