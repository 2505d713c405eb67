//! Output emission.
//!
//! Tables are written as CSV either to standard output or to a file. Files
//! are first written to a temporary sibling and then renamed over the
//! destination, so an interrupted run leaves the previous output intact.
//! A replaced file keeps its permissions; a new one gets the same mode as
//! any file created under the current umask.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use tempfile::Builder;

use crate::collect::{ParticipantTimes, Trial};
use crate::error::{PreprocessError, Result};

/// Where a table goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Standard output.
    Stdout,
    /// A file, replaced atomically.
    File(PathBuf),
}

impl Destination {
    /// Interpret a command-line argument, `-` meaning standard output.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdout
        } else {
            Self::File(PathBuf::from(arg))
        }
    }

    /// Run `write` against this destination.
    pub fn write_with<F>(&self, write: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Write, &Path) -> Result<()>,
    {
        match self {
            Self::Stdout => {
                let stdout = io::stdout();
                let mut lock = stdout.lock();
                write(&mut lock, Path::new("<stdout>"))?;
                lock.flush()
                    .map_err(|e| PreprocessError::io("<stdout>", e))
            }
            Self::File(path) => persist_atomically(path, |w| write(w, path.as_path())),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("<stdout>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Write to a temporary file next to `path`, then rename it over `path`.
pub fn persist_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let mut file = builder
        .tempfile_in(parent)
        .map_err(|e| PreprocessError::io(parent, e))?;
    if let Ok(existing) = fs::metadata(path) {
        file.as_file()
            .set_permissions(existing.permissions())
            .map_err(|e| PreprocessError::io(path, e))?;
    }
    write(&mut file)?;
    file.flush().map_err(|e| PreprocessError::io(path, e))?;
    file.persist(path)
        .map_err(|e| PreprocessError::io(path, e.error))?;
    Ok(())
}

/// Write the reading time table, header included even when empty.
pub fn write_trials<W: Write>(out: W, path: &Path, trials: &[Trial]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
    writer
        .write_record(Trial::HEADER)
        .map_err(|e| PreprocessError::csv(path, e))?;
    for trial in trials {
        writer
            .serialize(trial)
            .map_err(|e| PreprocessError::csv(path, e))?;
    }
    writer.flush().map_err(|e| PreprocessError::io(path, e))
}

/// Write the participant table with `questions` time columns.
pub fn write_participant_times<W: Write>(
    out: W,
    path: &Path,
    participants: &[ParticipantTimes],
    questions: usize,
) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
    writer
        .write_record(ParticipantTimes::header(questions))
        .map_err(|e| PreprocessError::csv(path, e))?;
    for entry in participants {
        let record = std::iter::once(entry.participant.clone())
            .chain(entry.times.iter().take(questions).map(|t| t.to_string()));
        writer
            .write_record(record)
            .map_err(|e| PreprocessError::csv(path, e))?;
    }
    writer.flush().map_err(|e| PreprocessError::io(path, e))
}
