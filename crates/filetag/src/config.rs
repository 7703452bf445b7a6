//! Engine configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FiletagError, Result};

pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// Tunables for [`QueryEngine`](crate::QueryEngine).
///
/// Missing fields in a JSON document fall back to their defaults. None of the
/// settings changes which files a query matches; only `include_implied_pairs`
/// changes what a tag/value listing contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Add the pairs implied by each listed fact to tag/value listings.
    ///
    /// Off: a listing holds exactly the stored (tag, value) facts of the
    /// matching files, so `os=*` lists `(os, linux)` but not the `unix` it
    /// implies. On: a rule `(T, any) -> (U, V)` also puts `(U, V)` in the
    /// listing of every file tagged `T`.
    pub include_implied_pairs: bool,
    /// Only load files carrying a tag the query can match. Results are the
    /// same either way.
    pub prefilter_candidates: bool,
    /// Candidate file count at which evaluation switches to rayon. Results
    /// and their order are the same either way.
    pub parallel_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            include_implied_pairs: false,
            prefilter_candidates: true,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|error| FiletagError::Config(format!("invalid engine config: {error}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw).map_err(|error| match error {
            FiletagError::Config(message) => {
                FiletagError::Config(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.parallel_threshold == 0 {
            return Err(FiletagError::Config(
                "parallel_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
