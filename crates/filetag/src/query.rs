//! Tag query language: expressions, parsing, compilation and matching.
//!
//! - Expression types (tag presence, all values, comparison, conjunction)
//! - Query text parsing
//! - Compilation into a [`Matcher`] using the implication graph
//! - Per-file evaluation of compiled matchers

mod comparison;
mod compile;
mod context;
mod expression;
mod matcher;
mod parser;

pub use comparison::{ComparisonOp, ValueComparator};
pub use compile::compile;
pub use context::{group_by_file, FileFacts};
pub use expression::QueryExpression;
pub use matcher::{FactPredicate, Matcher};
pub use parser::QueryParser;
