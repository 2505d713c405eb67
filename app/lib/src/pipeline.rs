//! The preprocessing pipeline.
//!
//! A run walks four stages in order: discover the exports, read each one,
//! feed its rows to a collector, and emit the collected table. Nothing is
//! written when discovery finds no input, so an empty data directory never
//! clobbers an earlier result.

use std::path::{Path, PathBuf};

use crate::collect::{
    ParticipantTimes, ParticipantTimesCollector, ReadingTimeCollector, Summary, Trial,
};
use crate::config::PreprocessConfig;
use crate::emit::{write_participant_times, write_trials, Destination};
use crate::error::Result;
use crate::source::{discover_inputs, read_rows, InputFile};

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Number of input files read.
    pub files: usize,
    /// Number of records produced.
    pub records: usize,
    /// Number of malformed trials, rows or participants dropped.
    pub skipped: usize,
    /// Where the table went, `None` when nothing was written.
    pub output: Option<Destination>,
}

/// Drives discovery, collection and emission for one configuration.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    /// Create a preprocessor for `config`.
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// List the exports of the configured data directory.
    pub fn discover(&self) -> Result<Vec<InputFile>> {
        self.discover_in(&self.config.data_dir)
    }

    /// List the exports of `dir` using the configured task set.
    pub fn discover_in(&self, dir: &Path) -> Result<Vec<InputFile>> {
        let inputs = discover_inputs(dir, &self.config.tasks)?;
        log::info!("found {} input file(s) in {}", inputs.len(), dir.display());
        Ok(inputs)
    }

    /// Collect reading trials from `inputs`, calling `on_file` before each.
    /// Returns the trials and the number dropped as malformed.
    pub fn collect_trials<F>(&self, inputs: &[InputFile], mut on_file: F) -> Result<(Vec<Trial>, usize)>
    where
        F: FnMut(&InputFile),
    {
        let mut collector = ReadingTimeCollector::new(self.config.skip_malformed);
        for input in inputs {
            on_file(input);
            let rows = read_rows(&input.path)?;
            log::debug!("{}: {} rows", input.path.display(), rows.len());
            collector.feed(&input.path, &rows)?;
        }
        let skipped = collector.skipped();
        Ok((collector.finish(), skipped))
    }

    /// Collect continue-button times from `inputs`, calling `on_file` before
    /// each. Returns the complete participants and the number dropped.
    pub fn collect_participant_times<F>(
        &self,
        inputs: &[InputFile],
        mut on_file: F,
    ) -> Result<(Vec<ParticipantTimes>, usize)>
    where
        F: FnMut(&InputFile),
    {
        let mut collector = ParticipantTimesCollector::new(self.config.skip_malformed);
        for input in inputs {
            on_file(input);
            let rows = read_rows(&input.path)?;
            collector.feed(&input.path, &rows)?;
        }
        collector.finish(self.config.question_count)
    }

    /// Collect trials from `inputs` and write them to `destination`.
    pub fn run_reading_times<F>(
        &self,
        inputs: &[InputFile],
        destination: &Destination,
        on_file: F,
    ) -> Result<RunReport>
    where
        F: FnMut(&InputFile),
    {
        if inputs.is_empty() {
            return Ok(nothing_to_do(destination));
        }
        let (trials, skipped) = self.collect_trials(inputs, on_file)?;
        destination.write_with(|w, path| write_trials(w, path, &trials))?;
        log::info!("wrote {} trial(s) to {}", trials.len(), destination);

        Ok(RunReport {
            files: inputs.len(),
            records: trials.len(),
            skipped,
            output: Some(destination.clone()),
        })
    }

    /// Collect participant times from `inputs` and write them to `destination`.
    pub fn run_participant_times<F>(
        &self,
        inputs: &[InputFile],
        destination: &Destination,
        on_file: F,
    ) -> Result<RunReport>
    where
        F: FnMut(&InputFile),
    {
        if inputs.is_empty() {
            return Ok(nothing_to_do(destination));
        }
        let (participants, skipped) = self.collect_participant_times(inputs, on_file)?;
        let questions = self.config.question_count;
        destination
            .write_with(|w, path| write_participant_times(w, path, &participants, questions))?;
        log::info!("wrote {} participant(s) to {}", participants.len(), destination);

        Ok(RunReport {
            files: inputs.len(),
            records: participants.len(),
            skipped,
            output: Some(destination.clone()),
        })
    }

    /// Collect trials from `inputs` and summarise them.
    pub fn summary<F>(&self, inputs: &[InputFile], on_file: F) -> Result<(Summary, RunReport)>
    where
        F: FnMut(&InputFile),
    {
        let (trials, skipped) = self.collect_trials(inputs, on_file)?;
        let summary = Summary::from_trials(&trials);
        let report = RunReport {
            files: inputs.len(),
            records: summary.participants.len(),
            skipped,
            output: None,
        };
        Ok((summary, report))
    }

    /// Default run: reading times from the configured directory into the
    /// configured output file.
    pub fn run(&self) -> Result<RunReport> {
        let inputs = self.discover()?;
        let destination = Destination::File(self.config.reading_times_output.clone());
        self.run_reading_times(&inputs, &destination, |_| {})
    }

    /// Destination of the reading time table from the configuration.
    pub fn reading_times_output(&self) -> PathBuf {
        self.config.reading_times_output.clone()
    }

    /// Destination of the participant table from the configuration.
    pub fn participant_times_output(&self) -> PathBuf {
        self.config.participant_times_output.clone()
    }
}

fn nothing_to_do(destination: &Destination) -> RunReport {
    log::warn!("no input files found; leaving {} untouched", destination);
    RunReport::default()
}
