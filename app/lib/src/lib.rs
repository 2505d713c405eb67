//! # Gorilla export preprocessing
//!
//! Turns the raw CSV exports of a Gorilla self-paced reading experiment into
//! analysis tables: one row per reading trial, one row per participant with
//! their question times, and a descriptive summary.
//!
//! The pipeline is a single synchronous pass: discover the exports in a data
//! directory, read each one, feed its rows to a collector, write the result.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collect;
pub mod config;
pub mod emit;
pub mod error;
pub mod pipeline;
pub mod source;

pub use collect::{
    ParticipantTimes, ParticipantTimesCollector, ReadingTimeCollector, Summary, Trial, NO_ANSWER,
};
pub use config::PreprocessConfig;
pub use emit::Destination;
pub use error::{PreprocessError, Result};
pub use pipeline::{Preprocessor, RunReport};
pub use source::{discover_inputs, read_rows, GorillaRow, InputFile};
