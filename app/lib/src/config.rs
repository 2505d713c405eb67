//! Preprocessor configuration.
//!
//! Every field has a default matching the conventional experiment layout:
//! exports live in `./data`, results are written to the working directory.
//! A configuration file may override any subset of fields.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PreprocessError, Result};

/// Task keys whose exports carry the reading experiment. Other tasks, such
/// as instructions or consent forms, are not of interest.
pub const DEFAULT_TASKS: [&str; 8] = [
    "25gc", "275q", "4d13", "4qbu", "94tq", "9zp6", "ah8j", "ty1q",
];

/// Configuration for a preprocessing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreprocessConfig {
    /// Directory holding the Gorilla CSV exports.
    pub data_dir: PathBuf,
    /// Task keys to include. Empty means every CSV file is included.
    pub tasks: BTreeSet<String>,
    /// Destination of the per-trial reading time table.
    pub reading_times_output: PathBuf,
    /// Destination of the per-participant continue-button table.
    pub participant_times_output: PathBuf,
    /// Number of `qN` columns in the participant table.
    pub question_count: usize,
    /// Drop malformed trials with a warning instead of failing the run.
    pub skip_malformed: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            tasks: DEFAULT_TASKS.iter().map(|t| t.to_string()).collect(),
            reading_times_output: PathBuf::from("all_reading_times.csv"),
            participant_times_output: PathBuf::from("participant_times.csv"),
            question_count: 6,
            skip_malformed: false,
        }
    }
}

impl PreprocessConfig {
    /// Load a configuration file. The format is chosen by extension:
    /// `.json` is read as JSON, anything else as TOML.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| PreprocessError::io(path, e))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let config: Self = if is_json {
            serde_json::from_str(&content)
                .map_err(|e| PreprocessError::Config(format!("{}: {}", path.display(), e)))?
        } else {
            toml::from_str(&content)
                .map_err(|e| PreprocessError::Config(format!("{}: {}", path.display(), e)))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.question_count == 0 {
            return Err(PreprocessError::Config(
                "question_count must be at least 1".to_string(),
            ));
        }
        if let Some(bad) = self.tasks.iter().find(|t| t.chars().count() != 4) {
            return Err(PreprocessError::Config(format!(
                "task key '{}' must be exactly four characters",
                bad
            )));
        }
        Ok(())
    }
}
