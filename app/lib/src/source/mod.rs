//! Input side of the pipeline: locating exports and reading their rows.

mod discover;
mod row;

pub use discover::{discover_inputs, task_id, InputFile};
pub use row::{column, parse_rows, read_rows, GorillaRow};
