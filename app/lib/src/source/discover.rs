//! Input discovery.
//!
//! Gorilla names its exports `data_exp_<experiment>-v<version>_task-<key>.csv`,
//! so the task a file belongs to is the four characters preceding `.csv`.
//! Any name ending in `csv` is taken as an export; the task key is read
//! positionally, four characters before the last four.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PreprocessError, Result};

/// A CSV export selected for processing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct InputFile {
    /// Full path to the export.
    pub path: PathBuf,
    /// Four-character task key, when the file name is long enough to carry one.
    pub task_id: Option<String>,
}

/// Extract the task key from a file name such as `..._task-25gc.csv`.
pub fn task_id(file_name: &str) -> Option<String> {
    if !file_name.ends_with("csv") {
        return None;
    }
    let chars: Vec<char> = file_name.chars().collect();
    if chars.len() < 8 {
        return None;
    }
    Some(chars[chars.len() - 8..chars.len() - 4].iter().collect())
}

/// List the exports in `dir` that belong to one of `tasks`.
///
/// Only regular files whose name ends in `csv` are considered. An empty `tasks` set
/// accepts every CSV. The result is sorted by path.
pub fn discover_inputs(dir: &Path, tasks: &BTreeSet<String>) -> Result<Vec<InputFile>> {
    if !dir.is_dir() {
        return Err(PreprocessError::MissingInputDir {
            path: dir.to_path_buf(),
        });
    }

    let mut inputs = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| PreprocessError::io(dir, e))? {
        let entry = entry.map_err(|e| PreprocessError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            log::debug!("skipping non UTF-8 file name {}", path.display());
            continue;
        };
        if !name.ends_with("csv") {
            continue;
        }

        let task = task_id(name);
        let wanted = tasks.is_empty() || task.as_ref().is_some_and(|t| tasks.contains(t));
        if !wanted {
            log::debug!("skipping {} (task not selected)", path.display());
            continue;
        }

        inputs.push(InputFile {
            path,
            task_id: task,
        });
    }

    inputs.sort();
    Ok(inputs)
}
