//! Append-only log entry: one historical version of a row.

use super::row::Row;
use crate::ids::SequenceValue;
use serde::{Deserialize, Serialize};

/// One committed version of a row, immutable once written.
///
/// Stored keyed by `sequence_value`, which is unique and strictly
/// increasing within a table, so a range scan of the log partition yields
/// the authoritative mutation order. `previous_row_etag` links versions of
/// the same row into a chain (`None` for the insert that created the row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub sequence_value: SequenceValue,
    pub previous_row_etag: Option<String>,
    pub row: Row,
}

impl LogEntry {
    pub fn new(sequence_value: SequenceValue, previous_row_etag: Option<String>, row: Row) -> Self {
        Self { sequence_value, previous_row_etag, row }
    }
}
