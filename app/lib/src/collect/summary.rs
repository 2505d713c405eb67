//! Descriptive statistics over collected trials.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use serde::Serialize;

use super::reading::Trial;

/// Mean reading time of a group of trials.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMean {
    /// Group label: a condition, an item, or `<item>_<condition>`.
    pub key: String,
    /// Number of trials in the group.
    pub trials: usize,
    /// Mean total reading time, in milliseconds.
    pub mean_reading_time: f64,
    /// Mean reading time per word, in milliseconds.
    pub mean_reading_time_per_word: f64,
}

/// Slider answers of one participant under one condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionScores {
    /// Condition letter.
    pub condition: String,
    /// Answers in ascending order. Trials without an answer are left out.
    pub answers: Vec<i64>,
    /// Mean answer, absent when there are no answers.
    pub mean: Option<f64>,
}

/// Per-participant totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantSummary {
    /// Participant private id.
    pub participant: String,
    /// Sum over trials of reading time divided by word count.
    pub reading_time_per_word: f64,
    /// Sum of answering times, in milliseconds.
    pub answering_time: i64,
    /// Answers per condition, one entry for every condition in the data.
    pub scores: Vec<ConditionScores>,
}

/// Summary of a set of trials.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Means per condition.
    pub conditions: Vec<GroupMean>,
    /// Means per item.
    pub items: Vec<GroupMean>,
    /// Means per item and condition.
    pub item_conditions: Vec<GroupMean>,
    /// Participants sorted by id.
    pub participants: Vec<ParticipantSummary>,
}

#[derive(Default)]
struct Accumulator {
    trials: usize,
    reading_time: i64,
    per_word: f64,
}

impl Accumulator {
    fn add(&mut self, trial: &Trial) {
        self.trials += 1;
        self.reading_time += trial.reading_time;
        self.per_word += per_word(trial);
    }

    fn into_mean(self, key: String) -> GroupMean {
        let n = self.trials.max(1) as f64;
        GroupMean {
            key,
            trials: self.trials,
            mean_reading_time: self.reading_time as f64 / n,
            mean_reading_time_per_word: self.per_word / n,
        }
    }
}

#[derive(Default)]
struct ParticipantAccumulator {
    per_word: f64,
    answering_time: i64,
    answers: BTreeMap<String, Vec<i64>>,
}

fn per_word(trial: &Trial) -> f64 {
    trial.reading_time as f64 / trial.words.max(1) as f64
}

fn means(groups: BTreeMap<String, Accumulator>) -> Vec<GroupMean> {
    groups
        .into_iter()
        .map(|(key, acc)| acc.into_mean(key))
        .collect()
}

impl Summary {
    /// Compute the summary of `trials`.
    pub fn from_trials(trials: &[Trial]) -> Self {
        let mut conditions: BTreeMap<String, Accumulator> = BTreeMap::new();
        let mut items: BTreeMap<String, Accumulator> = BTreeMap::new();
        let mut item_conditions: BTreeMap<String, Accumulator> = BTreeMap::new();
        let mut participants: BTreeMap<String, ParticipantAccumulator> = BTreeMap::new();
        let all_conditions: BTreeSet<&str> = trials.iter().map(|t| t.condition.as_str()).collect();

        for trial in trials {
            conditions.entry(trial.condition.clone()).or_default().add(trial);
            items.entry(trial.item_number.clone()).or_default().add(trial);
            item_conditions
                .entry(format!("{}_{}", trial.item_number, trial.condition))
                .or_default()
                .add(trial);

            let acc = participants.entry(trial.participant.clone()).or_default();
            acc.per_word += per_word(trial);
            acc.answering_time += trial.answering_time;
            let answers = acc.answers.entry(trial.condition.clone()).or_default();
            if trial.has_answer() {
                answers.push(trial.answer);
            }
        }

        let participants = participants
            .into_iter()
            .map(|(participant, mut acc)| {
                let scores = all_conditions
                    .iter()
                    .map(|condition| {
                        let mut answers = acc.answers.remove(*condition).unwrap_or_default();
                        answers.sort_unstable();
                        let mean = (!answers.is_empty())
                            .then(|| answers.iter().sum::<i64>() as f64 / answers.len() as f64);
                        ConditionScores {
                            condition: condition.to_string(),
                            answers,
                            mean,
                        }
                    })
                    .collect();
                ParticipantSummary {
                    participant,
                    reading_time_per_word: acc.per_word,
                    answering_time: acc.answering_time,
                    scores,
                }
            })
            .collect();

        Self {
            conditions: means(conditions),
            items: means(items),
            item_conditions: means(item_conditions),
            participants,
        }
    }

    /// Render a plain-text report.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let sections = [
            ("Average reading time per condition", &self.conditions, false),
            ("Average reading time per item", &self.items, false),
            (
                "Average reading time per word, per item and condition",
                &self.item_conditions,
                true,
            ),
        ];
        for (title, groups, per_word) in sections {
            let _ = writeln!(out, "{}", title);
            for group in groups {
                let value = if per_word {
                    group.mean_reading_time_per_word
                } else {
                    group.mean_reading_time
                };
                let _ = writeln!(out, "  * {}: {:.2}", group.key, value);
            }
        }

        let _ = writeln!(out, "Participants");
        for p in &self.participants {
            let _ = writeln!(
                out,
                "{}: {:.2} {:.2}",
                p.participant, p.reading_time_per_word, p.answering_time as f64
            );
            for score in &p.scores {
                let mean = score
                    .mean
                    .map(|m| format!("{:.2}", m))
                    .unwrap_or_else(|| "n/a".to_string());
                let _ = writeln!(out, "  * {}: {:?} ({})", score.condition, score.answers, mean);
            }
        }
        out
    }
}
