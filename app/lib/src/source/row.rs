//! Reading Gorilla exports into rows.
//!
//! Gorilla writes one row per zone event with a wide, version-dependent set
//! of columns. Only the columns the collectors need are kept. Cells are kept
//! as text: `None` means the row ended before the column (the `END OF FILE`
//! trailer row is short), `Some("")` means the cell was present but empty.

use std::fs;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::error::{PreprocessError, Result};

/// Column headers consumed from the export.
pub mod column {
    /// Participant identifier assigned by Gorilla.
    pub const PARTICIPANT: &str = "Participant Private ID";
    /// Kind of zone that produced the event.
    pub const ZONE_TYPE: &str = "Zone Type";
    /// Name given to the zone in the task builder.
    pub const ZONE_NAME: &str = "Zone Name";
    /// Milliseconds since the screen was shown.
    pub const REACTION_TIME: &str = "Reaction Time";
    /// Participant response.
    pub const RESPONSE: &str = "Response";
    /// Spreadsheet stimulus key, `<item>_<condition>`.
    pub const STIMULUS_ID: &str = "stimulus_id";
    /// Spreadsheet sentence shown word by word.
    pub const SENTENCE: &str = "sentence";
    /// Trial counter, `BEGIN TASK` on the first row.
    pub const TRIAL_NUMBER: &str = "Trial Number";
    /// Event counter, `END OF FILE` on the trailer row.
    pub const EVENT_INDEX: &str = "Event Index";
}

/// One event row of an export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GorillaRow {
    /// 1-based line of the row in its file.
    pub line: u64,
    /// `Participant Private ID`
    pub participant: Option<String>,
    /// `Zone Type`
    pub zone_type: Option<String>,
    /// `Zone Name`
    pub zone_name: Option<String>,
    /// `Reaction Time`
    pub reaction_time: Option<String>,
    /// `Response`
    pub response: Option<String>,
    /// `stimulus_id`
    pub stimulus_id: Option<String>,
    /// `sentence`
    pub sentence: Option<String>,
    /// `Trial Number`
    pub trial_number: Option<String>,
    /// `Event Index`
    pub event_index: Option<String>,
}

impl GorillaRow {
    /// Whether `Zone Type` equals `value`.
    pub fn zone_type_is(&self, value: &str) -> bool {
        self.zone_type.as_deref() == Some(value)
    }

    /// Whether `Zone Name` equals `value`.
    pub fn zone_name_is(&self, value: &str) -> bool {
        self.zone_name.as_deref() == Some(value)
    }
}

/// Header positions of the consumed columns.
#[derive(Debug, Clone, Copy, Default)]
struct ColumnIndex {
    participant: Option<usize>,
    zone_type: Option<usize>,
    zone_name: Option<usize>,
    reaction_time: Option<usize>,
    response: Option<usize>,
    stimulus_id: Option<usize>,
    sentence: Option<usize>,
    trial_number: Option<usize>,
    event_index: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        Self {
            participant: find(column::PARTICIPANT),
            zone_type: find(column::ZONE_TYPE),
            zone_name: find(column::ZONE_NAME),
            reaction_time: find(column::REACTION_TIME),
            response: find(column::RESPONSE),
            stimulus_id: find(column::STIMULUS_ID),
            sentence: find(column::SENTENCE),
            trial_number: find(column::TRIAL_NUMBER),
            event_index: find(column::EVENT_INDEX),
        }
    }

    fn row(&self, record: &StringRecord, line: u64) -> GorillaRow {
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).map(str::to_string);
        GorillaRow {
            line,
            participant: cell(self.participant),
            zone_type: cell(self.zone_type),
            zone_name: cell(self.zone_name),
            reaction_time: cell(self.reaction_time),
            response: cell(self.response),
            stimulus_id: cell(self.stimulus_id),
            sentence: cell(self.sentence),
            trial_number: cell(self.trial_number),
            event_index: cell(self.event_index),
        }
    }
}

/// Read every row of the export at `path`.
pub fn read_rows(path: &Path) -> Result<Vec<GorillaRow>> {
    let bytes = fs::read(path).map_err(|e| PreprocessError::io(path, e))?;
    parse_rows(path, bytes.as_slice())
}

/// Parse rows from any reader. `path` is only used to label errors.
pub fn parse_rows<R: Read>(path: &Path, mut input: R) -> Result<Vec<GorillaRow>> {
    let mut bytes = Vec::new();
    input
        .read_to_end(&mut bytes)
        .map_err(|e| PreprocessError::io(path, e))?;
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes[..]);

    let mut reader = ReaderBuilder::new().flexible(true).from_reader(body);
    let headers = reader
        .headers()
        .map_err(|e| PreprocessError::csv(path, e))?
        .clone();
    let index = ColumnIndex::from_headers(&headers);
    warn_missing_columns(path, &index);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| PreprocessError::csv(path, e))?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        rows.push(index.row(&record, line));
    }
    Ok(rows)
}

fn warn_missing_columns(path: &Path, index: &ColumnIndex) {
    let checks = [
        (column::PARTICIPANT, index.participant),
        (column::ZONE_TYPE, index.zone_type),
        (column::ZONE_NAME, index.zone_name),
        (column::REACTION_TIME, index.reaction_time),
    ];
    for (name, position) in checks {
        if position.is_none() {
            log::warn!("{}: no '{}' column in header", path.display(), name);
        }
    }
}
