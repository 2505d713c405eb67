//! Error types for the preprocessing pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, PreprocessError>;

/// Errors raised while discovering, parsing, transforming or emitting data.
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// The input directory does not exist or is not a directory.
    #[error("input directory '{}' does not exist or is not a directory", path.display())]
    MissingInputDir {
        /// The directory that was requested.
        path: PathBuf,
    },

    /// Filesystem failure on a specific path.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        /// The file or directory being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The CSV layer could not decode or encode a record.
    #[error("CSV error in '{}': {source}", path.display())]
    Csv {
        /// The file being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: csv::Error,
    },

    /// A cell the transformation needs is absent.
    #[error("{}:{line}: missing value for column '{column}'", path.display())]
    MissingField {
        /// Source file.
        path: PathBuf,
        /// 1-based line number in the source file.
        line: u64,
        /// Column header.
        column: &'static str,
    },

    /// A cell is present but cannot be interpreted.
    #[error("{}:{line}: invalid value '{value}' in column '{column}'", path.display())]
    InvalidField {
        /// Source file.
        path: PathBuf,
        /// 1-based line number in the source file.
        line: u64,
        /// Column header.
        column: &'static str,
        /// The offending cell content.
        value: String,
    },

    /// A `stimulus_id` too short to carry an item and a condition.
    #[error("{}:{line}: stimulus id '{value}' has no '<item>_<condition>' shape", path.display())]
    MalformedStimulus {
        /// Source file.
        path: PathBuf,
        /// 1-based line number in the source file.
        line: u64,
        /// The offending stimulus id.
        value: String,
    },

    /// A participant answered fewer questions than the output expects.
    #[error("participant '{participant}' has {found} continue-button times, expected {expected}")]
    IncompleteParticipant {
        /// Participant private id.
        participant: String,
        /// Number of times required.
        expected: usize,
        /// Number of times recorded.
        found: usize,
    },

    /// The configuration file could not be read or understood.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PreprocessError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a CSV error with the path it occurred on.
    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    /// Whether the error concerns a single record and may be skipped when
    /// the caller tolerates malformed input.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. }
                | Self::InvalidField { .. }
                | Self::MalformedStimulus { .. }
                | Self::IncompleteParticipant { .. }
        )
    }
}
