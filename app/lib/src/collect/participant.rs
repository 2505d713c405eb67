//! Continue-button times per participant.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use super::{parse_millis, required, zone};
use crate::error::{PreprocessError, Result};
use crate::source::{column, GorillaRow};

/// The continue-button reaction times of one participant, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantTimes {
    /// Participant private id.
    pub participant: String,
    /// Rounded reaction times, one per question screen.
    pub times: Vec<i64>,
}

impl ParticipantTimes {
    /// Header of a table with `questions` time columns.
    pub fn header(questions: usize) -> Vec<String> {
        std::iter::once("participant".to_string())
            .chain((1..=questions).map(|q| format!("q{}", q)))
            .collect()
    }
}

/// Gathers continue-button times, keeping participants in first-seen order.
#[derive(Debug, Default)]
pub struct ParticipantTimesCollector {
    skip_malformed: bool,
    order: Vec<ParticipantTimes>,
    index: HashMap<String, usize>,
    tainted: HashSet<String>,
    unattributed: usize,
}

impl ParticipantTimesCollector {
    /// Create a collector. With `skip_malformed`, a participant with a bad
    /// row or too few times is dropped with a warning.
    pub fn new(skip_malformed: bool) -> Self {
        Self {
            skip_malformed,
            ..Default::default()
        }
    }

    /// Consume the rows of one file.
    pub fn feed(&mut self, path: &Path, rows: &[GorillaRow]) -> Result<()> {
        for row in rows
            .iter()
            .filter(|r| r.zone_type_is(zone::CONTINUE_BUTTON_TYPE))
        {
            match self.step(path, row) {
                Ok(()) => {}
                Err(e) if self.skip_malformed && e.is_record_level() => {
                    log::warn!("{}; dropping participant", e);
                    match row.participant.as_deref().filter(|p| !p.is_empty()) {
                        Some(p) => {
                            self.tainted.insert(p.to_string());
                        }
                        None => self.unattributed += 1,
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn step(&mut self, path: &Path, row: &GorillaRow) -> Result<()> {
        // The opening row has no usable time and the trailer row no time at all.
        let ms = match parse_millis(path, row, column::REACTION_TIME, row.reaction_time.as_deref()) {
            Ok(ms) => ms,
            Err(PreprocessError::InvalidField { .. })
                if row.trial_number.as_deref() == Some(zone::BEGIN_TASK) =>
            {
                return Ok(())
            }
            Err(PreprocessError::MissingField { .. })
                if row.event_index.as_deref() == Some(zone::END_OF_FILE) =>
            {
                return Ok(())
            }
            Err(e) => return Err(e),
        };
        let participant = required(path, row, column::PARTICIPANT, row.participant.as_deref())?;
        self.push(participant, ms);
        Ok(())
    }

    fn push(&mut self, participant: &str, ms: i64) {
        let slot = match self.index.get(participant) {
            Some(&slot) => slot,
            None => {
                self.order.push(ParticipantTimes {
                    participant: participant.to_string(),
                    times: Vec::new(),
                });
                self.index
                    .insert(participant.to_string(), self.order.len() - 1);
                self.order.len() - 1
            }
        };
        self.order[slot].times.push(ms);
    }

    /// Number of participants with a bad row so far, plus bad rows that
    /// name no participant. Incomplete participants are only known at
    /// [`finish`](Self::finish).
    pub fn skipped(&self) -> usize {
        self.tainted.len() + self.unattributed
    }

    /// Hand back one entry per participant, truncated to `questions` times.
    ///
    /// A participant with fewer than `questions` times is an error unless the
    /// collector skips malformed input. The count returned alongside is the
    /// number of distinct participants dropped, plus bad rows that name no
    /// participant.
    pub fn finish(mut self, questions: usize) -> Result<(Vec<ParticipantTimes>, usize)> {
        let mut complete = Vec::with_capacity(self.order.len());
        let mut dropped = self.tainted.len();
        for mut entry in std::mem::take(&mut self.order) {
            // Times after a dropped row would shift into the wrong question.
            if self.tainted.contains(&entry.participant) {
                continue;
            }
            if entry.times.len() < questions {
                let err = PreprocessError::IncompleteParticipant {
                    participant: entry.participant,
                    expected: questions,
                    found: entry.times.len(),
                };
                if !self.skip_malformed {
                    return Err(err);
                }
                log::warn!("{}; skipping participant", err);
                dropped += 1;
                continue;
            }
            entry.times.truncate(questions);
            complete.push(entry);
        }
        Ok((complete, dropped + self.unattributed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(line: u64, participant: &str, rt: Option<&str>) -> GorillaRow {
        GorillaRow {
            line,
            participant: Some(participant.to_string()),
            zone_type: Some("continue_button".to_string()),
            reaction_time: rt.map(str::to_string),
            trial_number: Some(line.to_string()),
            event_index: Some(line.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_header() {
        assert_eq!(
            ParticipantTimes::header(3),
            vec!["participant", "q1", "q2", "q3"]
        );
    }

    #[test]
    fn test_first_seen_order_and_truncation() {
        let rows = vec![
            press(2, "zed", Some("10.2")),
            press(3, "amy", Some("5")),
            press(4, "zed", Some("11.5")),
            press(5, "amy", Some("6")),
            press(6, "zed", Some("12.5")),
        ];
        let mut collector = ParticipantTimesCollector::new(false);
        collector.feed(Path::new("f.csv"), &rows).unwrap();
        let (times, skipped) = collector.finish(2).unwrap();

        assert_eq!(skipped, 0);
        assert_eq!(times[0].participant, "zed");
        assert_eq!(times[0].times, vec![10, 12]);
        assert_eq!(times[1].participant, "amy");
        assert_eq!(times[1].times, vec![5, 6]);
    }

    #[test]
    fn test_other_zones_ignored() {
        let mut row = press(2, "p", Some("oops"));
        row.zone_type = Some("response_slider_endValue".to_string());
        let mut collector = ParticipantTimesCollector::new(false);
        collector.feed(Path::new("f.csv"), &[row]).unwrap();
        assert!(collector.finish(1).unwrap().0.is_empty());
    }

    #[test]
    fn test_begin_task_row_may_lack_time() {
        let mut row = press(2, "p", Some(""));
        row.trial_number = Some("BEGIN TASK".to_string());
        let mut collector = ParticipantTimesCollector::new(false);
        collector
            .feed(Path::new("f.csv"), &[row, press(3, "p", Some("40"))])
            .unwrap();
        let (times, _) = collector.finish(1).unwrap();
        assert_eq!(times[0].times, vec![40]);
    }

    #[test]
    fn test_end_of_file_row_may_be_short() {
        let mut row = press(9, "p", None);
        row.event_index = Some("END OF FILE".to_string());
        let mut collector = ParticipantTimesCollector::new(false);
        collector.feed(Path::new("f.csv"), &[row]).unwrap();
    }

    #[test]
    fn test_unexpected_missing_value_is_an_error() {
        let mut collector = ParticipantTimesCollector::new(false);
        let err = collector
            .feed(Path::new("f.csv"), &[press(4, "p", Some("n/a"))])
            .unwrap_err();
        assert!(matches!(err, PreprocessError::InvalidField { line: 4, .. }));

        let err = collector
            .feed(Path::new("f.csv"), &[press(5, "p", None)])
            .unwrap_err();
        assert!(matches!(err, PreprocessError::MissingField { line: 5, .. }));
    }

    #[test]
    fn test_incomplete_participant() {
        let mut collector = ParticipantTimesCollector::new(false);
        collector
            .feed(Path::new("f.csv"), &[press(2, "p", Some("1"))])
            .unwrap();
        let err = collector.finish(6).unwrap_err();
        assert!(matches!(
            err,
            PreprocessError::IncompleteParticipant {
                expected: 6,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_incomplete_participant_skipped() {
        let rows = vec![
            press(2, "short", Some("1")),
            press(3, "full", Some("1")),
            press(4, "full", Some("2")),
            press(5, "bad", Some("x")),
        ];
        let mut collector = ParticipantTimesCollector::new(true);
        collector.feed(Path::new("f.csv"), &rows).unwrap();
        let (times, skipped) = collector.finish(2).unwrap();

        assert_eq!(skipped, 2);
        assert_eq!(times.len(), 1);
        assert_eq!(times[0].participant, "full");
    }

    #[test]
    fn test_bad_rows_count_once_per_participant() {
        let rows = vec![
            press(2, "p", Some("1")),
            press(3, "p", Some("x")),
            press(4, "p", Some("y")),
        ];
        let mut collector = ParticipantTimesCollector::new(true);
        collector.feed(Path::new("f.csv"), &rows).unwrap();
        assert_eq!(collector.skipped(), 1);

        // Incomplete as well as tainted, still one participant.
        let (times, skipped) = collector.finish(3).unwrap();
        assert!(times.is_empty());
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_bad_row_drops_otherwise_complete_participant() {
        let rows = vec![
            press(2, "p", Some("1")),
            press(3, "p", Some("x")),
            press(4, "p", Some("3")),
            press(5, "q", Some("4")),
            press(6, "q", Some("5")),
        ];
        let mut collector = ParticipantTimesCollector::new(true);
        collector.feed(Path::new("f.csv"), &rows).unwrap();
        let (times, skipped) = collector.finish(2).unwrap();

        assert_eq!(skipped, 1);
        assert_eq!(times.len(), 1);
        assert_eq!(times[0].participant, "q");
    }

    #[test]
    fn test_bad_row_without_participant_counted() {
        let mut row = press(2, "", Some("x"));
        row.participant = None;
        let mut collector = ParticipantTimesCollector::new(true);
        collector.feed(Path::new("f.csv"), &[row]).unwrap();
        assert_eq!(collector.finish(1).unwrap(), (Vec::new(), 1));
    }
}
