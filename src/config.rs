use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::derivation::SearchConfig;
use crate::generator::GeneratorConfig;
use crate::utils::{GrammarError, Result};

/// Limits for sampling and derivation, loadable from JSON
///
/// Missing sections and fields fall back to their defaults:
///
/// ```json
/// { "generator": { "max_samples": 5 }, "search": { "max_depth": 20 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub generator: GeneratorConfig,
    pub search: SearchConfig,
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parse configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GrammarError::Config(e.to_string()))
    }
}
