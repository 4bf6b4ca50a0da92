//! Table entry: the per-table version anchor.

use crate::ids::{SequenceValue, TableId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One record per synchronized table.
///
/// `data_etag` moves to a fresh opaque token on every committed row
/// mutation; `schema_etag` changes only when the column definitions change.
/// During creation the new schema token sits in `pending_schema_etag` and is
/// promoted once the column set is persisted, so a crash mid-creation leaves
/// a recognizably incomplete entry instead of a half-defined table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableEntry {
    pub table_id: TableId,
    pub schema_etag: Option<String>,
    pub pending_schema_etag: Option<String>,
    pub data_etag: String,
    /// Sequencer reading taken at creation, strictly below every log entry
    /// of this table. Anchors "changes since" queries that start from the
    /// creation-time data ETag.
    pub apriori_data_sequence_value: SequenceValue,
    pub created_at: DateTime<Utc>,
}

impl TableEntry {
    /// Whether creation completed (column definitions promoted).
    pub fn is_active(&self) -> bool {
        self.schema_etag.is_some()
    }
}
