//! Transformations from raw export rows to analysis tables.
//!
//! Each collector consumes the rows of one file at a time through `feed` and
//! hands back its table through `finish`.

mod participant;
mod reading;
mod summary;

use std::path::Path;

use crate::error::{PreprocessError, Result};
use crate::source::GorillaRow;

pub use participant::{ParticipantTimes, ParticipantTimesCollector};
pub use reading::{ReadingTimeCollector, Trial, NO_ANSWER};
pub use summary::{ConditionScores, GroupMean, ParticipantSummary, Summary};

/// Zone values the collectors react to.
pub mod zone {
    /// `Zone Name` of a self-paced reading word reveal.
    pub const SPR: &str = "spr";
    /// `Zone Name` of the button that ends a reading trial.
    pub const CONTINUE_BUTTON_NAME: &str = "continueButton";
    /// `Zone Type` of the button that ends a question screen.
    pub const CONTINUE_BUTTON_TYPE: &str = "continue_button";
    /// `Zone Type` carrying the final slider position.
    pub const SLIDER_END: &str = "response_slider_endValue";
    /// `Trial Number` of the row opening a task.
    pub const BEGIN_TASK: &str = "BEGIN TASK";
    /// `Event Index` of the trailer row.
    pub const END_OF_FILE: &str = "END OF FILE";
}

/// Round a time in milliseconds to an integer, ties to even.
pub fn round_millis(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// Parse a `Reaction Time` style cell into whole milliseconds.
fn parse_millis(
    path: &Path,
    row: &GorillaRow,
    column: &'static str,
    cell: Option<&str>,
) -> Result<i64> {
    let raw = required(path, row, column, cell)?;
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(round_millis(value)),
        _ => Err(invalid(path, row, column, raw)),
    }
}

/// Parse an integer cell such as the slider `Response`.
fn parse_integer(
    path: &Path,
    row: &GorillaRow,
    column: &'static str,
    cell: Option<&str>,
) -> Result<i64> {
    let raw = required(path, row, column, cell)?;
    raw.trim()
        .parse::<i64>()
        .map_err(|_| invalid(path, row, column, raw))
}

fn required<'a>(
    path: &Path,
    row: &GorillaRow,
    column: &'static str,
    cell: Option<&'a str>,
) -> Result<&'a str> {
    cell.ok_or_else(|| PreprocessError::MissingField {
        path: path.to_path_buf(),
        line: row.line,
        column,
    })
}

fn invalid(path: &Path, row: &GorillaRow, column: &'static str, value: &str) -> PreprocessError {
    PreprocessError::InvalidField {
        path: path.to_path_buf(),
        line: row.line,
        column,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_round_ties_to_even() {
        assert_eq!(round_millis(0.5), 0);
        assert_eq!(round_millis(1.5), 2);
        assert_eq!(round_millis(2.5), 2);
        assert_eq!(round_millis(350.4), 350);
        assert_eq!(round_millis(350.6), 351);
    }

    #[test]
    fn test_parse_millis_rejects_non_finite() {
        let row = GorillaRow {
            line: 7,
            ..Default::default()
        };
        let path = Path::new("f.csv");
        assert!(parse_millis(path, &row, "Reaction Time", Some("nan")).is_err());
        assert!(parse_millis(path, &row, "Reaction Time", Some("inf")).is_err());
        assert_eq!(
            parse_millis(path, &row, "Reaction Time", Some(" 12.7 ")).unwrap(),
            13
        );
    }

    #[test]
    fn test_parse_integer_rejects_decimal() {
        let row = GorillaRow::default();
        let result = parse_integer(Path::new("f.csv"), &row, "Response", Some("3.0"));
        assert!(matches!(result, Err(PreprocessError::InvalidField { .. })));
    }

    proptest! {
        #[test]
        fn prop_rounding_stays_within_half(value in -1.0e9f64..1.0e9f64) {
            let rounded = round_millis(value) as f64;
            prop_assert!((rounded - value).abs() <= 0.5);
        }
    }
}
