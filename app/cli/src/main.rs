use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gorilla_preprocess::{
    Destination, InputFile, PreprocessConfig, PreprocessError, Preprocessor, RunReport, Summary,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use std::path::{Path, PathBuf};

/// Preprocess the CSV exports of a Gorilla self-paced reading experiment.
///
/// Without a subcommand, collects per-trial reading times from `./data`
/// into `./all_reading_times.csv`.
#[derive(Parser)]
#[command(name = "gorilla-preprocess")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Configuration file path (TOML or JSON)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Drop malformed trials with a warning instead of failing
    #[arg(long, global = true)]
    skip_malformed: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Summary output formats
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// Human-readable report
    Text,
    /// JSON document
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect one row per reading trial
    ReadingTimes {
        /// Directory holding the exports
        #[arg(short, long, value_name = "DIR")]
        input: Option<PathBuf>,

        /// Output file (use '-' for stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<String>,
    },

    /// Collect the continue-button times of every participant
    ParticipantTimes {
        /// Directory holding the exports
        #[arg(short, long, value_name = "DIR")]
        input: Option<PathBuf>,

        /// Output file (use '-' for stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<String>,
    },

    /// Print descriptive statistics of the reading trials
    Summary {
        /// Directory holding the exports
        #[arg(short, long, value_name = "DIR")]
        input: Option<PathBuf>,

        /// Report format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity flags
    setup_logging(cli.verbose, cli.quiet);

    // Load configuration if specified
    let mut config = if let Some(config_path) = &cli.config {
        load_config(config_path)?
    } else {
        PreprocessConfig::default()
    };
    if cli.skip_malformed {
        config.skip_malformed = true;
    }
    let preprocessor = Preprocessor::new(config);

    // Execute the appropriate command
    match cli.command {
        None => {
            reading_times_command(&preprocessor, None, None, cli.quiet)?;
        }
        Some(Commands::ReadingTimes { input, output }) => {
            reading_times_command(&preprocessor, input.as_deref(), output.as_deref(), cli.quiet)?;
        }
        Some(Commands::ParticipantTimes { input, output }) => {
            participant_times_command(
                &preprocessor,
                input.as_deref(),
                output.as_deref(),
                cli.quiet,
            )?;
        }
        Some(Commands::Summary { input, format }) => {
            summary_command(&preprocessor, input.as_deref(), format, cli.quiet)?;
        }
    }

    Ok(())
}

/// Set up logging based on verbosity flags. `RUST_LOG` still applies on top.
fn setup_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

/// Load configuration from a file
fn load_config(path: &Path) -> Result<PreprocessConfig> {
    PreprocessConfig::from_path(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Discover the exports of `input`, or of the configured data directory
fn discover(preprocessor: &Preprocessor, input: Option<&Path>) -> Result<Vec<InputFile>> {
    let dir = input.unwrap_or(preprocessor.config().data_dir.as_path());
    preprocessor
        .discover_in(dir)
        .map_err(|e| map_preprocess_error(e, "Input discovery"))
}

/// A per-file progress bar, hidden in quiet mode
fn progress_bar(len: usize, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}") {
        bar.set_style(style);
    }
    bar
}

/// Advance `bar` past one input file
fn tick(bar: &ProgressBar) -> impl FnMut(&InputFile) + '_ {
    move |file: &InputFile| {
        let name = file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        bar.set_message(name);
        bar.inc(1);
    }
}

/// Execute the reading-times command
fn reading_times_command(
    preprocessor: &Preprocessor,
    input: Option<&Path>,
    output: Option<&str>,
    quiet: bool,
) -> Result<()> {
    let destination = output
        .map(Destination::from_arg)
        .unwrap_or_else(|| Destination::File(preprocessor.reading_times_output()));
    let inputs = discover(preprocessor, input)?;

    let bar = progress_bar(inputs.len(), quiet);
    let report = preprocessor
        .run_reading_times(&inputs, &destination, tick(&bar))
        .map_err(|e| map_preprocess_error(e, "Reading time collection"))?;
    bar.finish_and_clear();

    if !quiet {
        print_report(&report, "trials");
    }
    Ok(())
}

/// Execute the participant-times command
fn participant_times_command(
    preprocessor: &Preprocessor,
    input: Option<&Path>,
    output: Option<&str>,
    quiet: bool,
) -> Result<()> {
    let destination = output
        .map(Destination::from_arg)
        .unwrap_or_else(|| Destination::File(preprocessor.participant_times_output()));
    let inputs = discover(preprocessor, input)?;

    let bar = progress_bar(inputs.len(), quiet);
    let report = preprocessor
        .run_participant_times(&inputs, &destination, tick(&bar))
        .map_err(|e| map_preprocess_error(e, "Participant time collection"))?;
    bar.finish_and_clear();

    if !quiet {
        print_report(&report, "participants");
    }
    Ok(())
}

/// Execute the summary command
fn summary_command(
    preprocessor: &Preprocessor,
    input: Option<&Path>,
    format: Format,
    quiet: bool,
) -> Result<()> {
    let inputs = discover(preprocessor, input)?;
    if inputs.is_empty() {
        log::warn!("no input files found; nothing to summarise");
        return Ok(());
    }

    let bar = progress_bar(inputs.len(), quiet);
    let (summary, report) = preprocessor
        .summary(&inputs, tick(&bar))
        .map_err(|e| map_preprocess_error(e, "Summary"))?;
    bar.finish_and_clear();

    match format {
        Format::Text => print!("{}", summary.render_text()),
        Format::Json => println!("{}", render_json(&summary)?),
    }

    if report.skipped > 0 && !quiet {
        eprintln!("Skipped {} malformed record(s)", report.skipped);
    }
    Ok(())
}

fn render_json(summary: &Summary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("Failed to serialize summary")
}

/// Print the outcome of a run to stderr
fn print_report(report: &RunReport, noun: &str) {
    match &report.output {
        Some(output) => eprintln!(
            "Wrote {} {} from {} file(s) to {}",
            report.records, noun, report.files, output
        ),
        None => eprintln!("No input files found; nothing written"),
    }
    if report.skipped > 0 {
        eprintln!("Skipped {} malformed record(s)", report.skipped);
    }
}

/// Map PreprocessError to anyhow::Error with context
fn map_preprocess_error(error: PreprocessError, context: &str) -> anyhow::Error {
    match error {
        PreprocessError::MissingInputDir { path } => anyhow::anyhow!(
            "{}: input directory '{}' not found. Place the Gorilla exports there or pass --input.",
            context,
            path.display()
        ),
        err @ PreprocessError::IncompleteParticipant { .. } => {
            anyhow::Error::new(err).context(format!(
                "{}: rerun with --skip-malformed to drop incomplete participants",
                context
            ))
        }
        other => anyhow::Error::new(other).context(context.to_string()),
    }
}
