//! Per-trial reading times.
//!
//! A reading trial is a run of `spr` word reveals, optionally a slider
//! answer, and a closing `continueButton` row. The closing row carries the
//! participant, the stimulus and the time taken to answer.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{parse_integer, parse_millis, required, zone};
use crate::error::{PreprocessError, Result};
use crate::source::{column, GorillaRow};

/// Answer recorded when a trial has no slider response.
pub const NO_ANSWER: i64 = -1;

/// One completed reading trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    /// Participant private id.
    pub participant: String,
    /// Stimulus id without its condition suffix.
    pub item_number: String,
    /// Condition letter of the stimulus.
    pub condition: String,
    /// Number of space-separated words in the sentence.
    pub words: usize,
    /// Sum of the word reveal times, in milliseconds.
    pub reading_time: i64,
    /// Final slider position, or [`NO_ANSWER`].
    pub answer: i64,
    /// Time spent on the answer screen, in milliseconds.
    pub answering_time: i64,
}

impl Trial {
    /// Column order of the emitted table.
    pub const HEADER: [&'static str; 7] = [
        "participant",
        "item_number",
        "condition",
        "words",
        "reading_time",
        "answer",
        "answering_time",
    ];

    /// Whether the participant moved the slider.
    pub fn has_answer(&self) -> bool {
        self.answer != NO_ANSWER
    }
}

/// Split `<item>_<c>` into the item and the condition letter.
fn split_stimulus(stimulus: &str) -> Option<(String, String)> {
    let chars: Vec<char> = stimulus.chars().collect();
    if chars.len() < 3 {
        return None;
    }
    let item: String = chars[..chars.len() - 2].iter().collect();
    let condition = chars[chars.len() - 1].to_string();
    Some((item, condition))
}

#[derive(Debug)]
struct TrialState {
    reveals: Vec<i64>,
    answer: i64,
    tainted: bool,
}

impl TrialState {
    fn new() -> Self {
        Self {
            reveals: Vec::new(),
            answer: NO_ANSWER,
            tainted: false,
        }
    }

    fn is_pristine(&self) -> bool {
        self.reveals.is_empty() && self.answer == NO_ANSWER && !self.tainted
    }
}

/// Builds [`Trial`]s from export rows.
#[derive(Debug, Default)]
pub struct ReadingTimeCollector {
    skip_malformed: bool,
    trials: Vec<Trial>,
    skipped: usize,
}

impl ReadingTimeCollector {
    /// Create a collector. With `skip_malformed`, a trial containing a bad
    /// row is dropped with a warning instead of failing the run.
    pub fn new(skip_malformed: bool) -> Self {
        Self {
            skip_malformed,
            ..Default::default()
        }
    }

    /// Consume the rows of one file. Trial state never crosses files.
    pub fn feed(&mut self, path: &Path, rows: &[GorillaRow]) -> Result<()> {
        let mut state = TrialState::new();
        for row in rows {
            match self.step(path, row, &mut state) {
                Ok(()) => {}
                Err(e) if self.skip_malformed && e.is_record_level() => {
                    log::warn!("{}; dropping trial", e);
                    if row.zone_name_is(zone::CONTINUE_BUTTON_NAME) {
                        self.skipped += 1;
                        state = TrialState::new();
                    } else {
                        state.tainted = true;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        if !state.is_pristine() {
            // An unclosed trial never yields a record, so it is not counted as dropped.
            log::debug!("{}: trailing rows after the last trial", path.display());
        }
        Ok(())
    }

    fn step(&mut self, path: &Path, row: &GorillaRow, state: &mut TrialState) -> Result<()> {
        if row.zone_name_is(zone::SPR) {
            let ms = parse_millis(path, row, column::REACTION_TIME, row.reaction_time.as_deref())?;
            state.reveals.push(ms);
        } else if row.zone_type_is(zone::SLIDER_END) {
            state.answer = parse_integer(path, row, column::RESPONSE, row.response.as_deref())?;
        } else if row.zone_name_is(zone::CONTINUE_BUTTON_NAME) {
            if state.tainted {
                self.skipped += 1;
            } else {
                let trial = close_trial(path, row, state)?;
                self.trials.push(trial);
            }
            *state = TrialState::new();
        }
        Ok(())
    }

    /// Number of trials dropped as malformed so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Hand back the trials in input order.
    pub fn finish(self) -> Vec<Trial> {
        self.trials
    }
}

fn close_trial(path: &Path, row: &GorillaRow, state: &TrialState) -> Result<Trial> {
    let participant = required(path, row, column::PARTICIPANT, row.participant.as_deref())?;
    let stimulus = required(path, row, column::STIMULUS_ID, row.stimulus_id.as_deref())?;
    let (item_number, condition) =
        split_stimulus(stimulus).ok_or_else(|| PreprocessError::MalformedStimulus {
            path: path.to_path_buf(),
            line: row.line,
            value: stimulus.to_string(),
        })?;
    let sentence = required(path, row, column::SENTENCE, row.sentence.as_deref())?;
    let answering_time = parse_millis(path, row, column::REACTION_TIME, row.reaction_time.as_deref())?;

    Ok(Trial {
        participant: participant.to_string(),
        item_number,
        condition,
        words: sentence.split(' ').count(),
        reading_time: state.reveals.iter().sum(),
        answer: state.answer,
        answering_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spr(line: u64, rt: &str) -> GorillaRow {
        GorillaRow {
            line,
            zone_name: Some("spr".to_string()),
            zone_type: Some("response_keyboard".to_string()),
            reaction_time: Some(rt.to_string()),
            ..Default::default()
        }
    }

    fn slider(line: u64, response: &str) -> GorillaRow {
        GorillaRow {
            line,
            zone_name: Some("slider".to_string()),
            zone_type: Some("response_slider_endValue".to_string()),
            response: Some(response.to_string()),
            ..Default::default()
        }
    }

    fn button(line: u64, participant: &str, stimulus: &str, sentence: &str, rt: &str) -> GorillaRow {
        GorillaRow {
            line,
            participant: Some(participant.to_string()),
            zone_name: Some("continueButton".to_string()),
            zone_type: Some("continue_button".to_string()),
            stimulus_id: Some(stimulus.to_string()),
            sentence: Some(sentence.to_string()),
            reaction_time: Some(rt.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_split_stimulus() {
        assert_eq!(
            split_stimulus("item12_b"),
            Some(("item12".to_string(), "b".to_string()))
        );
        assert_eq!(split_stimulus("7_a"), Some(("7".to_string(), "a".to_string())));
        assert_eq!(split_stimulus("_a"), None);
    }

    #[test]
    fn test_collects_single_trial() {
        let rows = vec![
            spr(2, "300.4"),
            spr(3, "250.5"),
            spr(4, "410"),
            slider(5, "4"),
            button(6, "p1", "12_a", "The cat sat", "1500.2"),
        ];
        let mut collector = ReadingTimeCollector::new(false);
        collector.feed(Path::new("f.csv"), &rows).unwrap();
        let trials = collector.finish();

        assert_eq!(
            trials,
            vec![Trial {
                participant: "p1".to_string(),
                item_number: "12".to_string(),
                condition: "a".to_string(),
                words: 3,
                reading_time: 300 + 250 + 410,
                answer: 4,
                answering_time: 1500,
            }]
        );
    }

    #[test]
    fn test_state_resets_between_trials() {
        let rows = vec![
            spr(2, "100"),
            slider(3, "2"),
            button(4, "p1", "1_a", "one two", "10"),
            spr(5, "200"),
            button(6, "p1", "2_b", "three", "20"),
        ];
        let mut collector = ReadingTimeCollector::new(false);
        collector.feed(Path::new("f.csv"), &rows).unwrap();
        let trials = collector.finish();

        assert_eq!(trials.len(), 2);
        assert_eq!(trials[1].reading_time, 200);
        assert_eq!(trials[1].answer, NO_ANSWER);
        assert!(!trials[1].has_answer());
    }

    #[test]
    fn test_state_does_not_cross_files() {
        let mut collector = ReadingTimeCollector::new(false);
        collector
            .feed(Path::new("a.csv"), &[spr(2, "999"), slider(3, "5")])
            .unwrap();
        collector
            .feed(Path::new("b.csv"), &[button(2, "p2", "3_a", "x", "1")])
            .unwrap();
        let trials = collector.finish();

        assert_eq!(trials[0].reading_time, 0);
        assert_eq!(trials[0].answer, NO_ANSWER);
    }

    #[test]
    fn test_malformed_reveal_is_an_error() {
        let rows = vec![spr(9, "fast"), button(10, "p1", "1_a", "x", "1")];
        let mut collector = ReadingTimeCollector::new(false);
        let err = collector.feed(Path::new("f.csv"), &rows).unwrap_err();

        match err {
            PreprocessError::InvalidField { line, column, value, .. } => {
                assert_eq!(line, 9);
                assert_eq!(column, "Reaction Time");
                assert_eq!(value, "fast");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_skip_malformed_drops_whole_trial() {
        let rows = vec![
            spr(2, "fast"),
            spr(3, "100"),
            button(4, "p1", "1_a", "x", "1"),
            spr(5, "50"),
            button(6, "p1", "2_a", "y", "2"),
            button(7, "p1", "b", "z", "3"),
        ];
        let mut collector = ReadingTimeCollector::new(true);
        collector.feed(Path::new("f.csv"), &rows).unwrap();
        assert_eq!(collector.skipped(), 2);

        let trials = collector.finish();
        assert_eq!(trials.len(), 1);
        assert_eq!(trials[0].item_number, "2");
        assert_eq!(trials[0].reading_time, 50);
    }

    #[test]
    fn test_skip_counts_each_dropped_trial_once() {
        let rows = vec![
            spr(2, "bad"),
            spr(3, "worse"),
            slider(4, "many"),
            button(5, "p1", "1_a", "x", "1"),
        ];
        let mut collector = ReadingTimeCollector::new(true);
        collector.feed(Path::new("f.csv"), &rows).unwrap();
        assert_eq!(collector.skipped(), 1);
        assert!(collector.finish().is_empty());
    }

    #[test]
    fn test_skip_ignores_unclosed_trial() {
        let rows = vec![button(2, "p1", "1_a", "x", "1"), spr(3, "bad")];
        let mut collector = ReadingTimeCollector::new(true);
        collector.feed(Path::new("f.csv"), &rows).unwrap();
        assert_eq!(collector.skipped(), 0);
        assert_eq!(collector.finish().len(), 1);
    }

    #[test]
    fn test_missing_participant_is_an_error() {
        let mut row = button(4, "p1", "1_a", "x", "1");
        row.participant = None;
        let mut collector = ReadingTimeCollector::new(false);
        let err = collector.feed(Path::new("f.csv"), &[row]).unwrap_err();
        assert!(matches!(
            err,
            PreprocessError::MissingField {
                column: "Participant Private ID",
                ..
            }
        ));
    }

    #[test]
    fn test_word_count_splits_on_single_spaces() {
        let rows = vec![button(2, "p1", "1_a", "a  b", "1")];
        let mut collector = ReadingTimeCollector::new(false);
        collector.feed(Path::new("f.csv"), &rows).unwrap();
        assert_eq!(collector.finish()[0].words, 3);
    }
}
