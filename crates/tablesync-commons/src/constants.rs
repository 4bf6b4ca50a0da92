//! Partition naming for the storage backend.
//!
//! Every entity type lives in its own partition. System metadata partitions
//! are fixed names; per-table row and log partitions are derived from the
//! table id so that deleting a table can drop its data wholesale.

use crate::ids::TableId;

/// Names of the fixed system partitions plus builders for per-table ones.
pub struct Partitions;

impl Partitions {
    /// Table entries (one record per synchronized table).
    pub const TABLE_ENTRIES: &'static str = "table_entries";

    /// Column definition sets, keyed by (table id, schema ETag).
    pub const COLUMN_DEFINITIONS: &'static str = "column_definitions";

    /// Table-level access control lists.
    pub const TABLE_ACLS: &'static str = "table_acls";

    /// Synchronized file metadata records.
    pub const FILE_INFO: &'static str = "file_info";

    /// Raw content of synchronized files.
    pub const FILE_BLOBS: &'static str = "file_blobs";

    /// Cached aggregate manifest digests.
    pub const MANIFEST_ETAGS: &'static str = "manifest_etags";

    /// Per-table sequence counters.
    pub const SEQUENCES: &'static str = "sequences";

    /// Advisory lock lease records.
    pub const LOCKS: &'static str = "locks";

    /// Prefix for per-table current-state row partitions.
    pub const ROWS_PREFIX: &'static str = "rows:";

    /// Prefix for per-table append-only log partitions.
    pub const LOG_PREFIX: &'static str = "log:";

    /// Partition holding the current state of every row of a table.
    pub fn rows(table_id: &TableId) -> String {
        format!("{}{}", Self::ROWS_PREFIX, table_id.as_str())
    }

    /// Partition holding the append-only mutation log of a table.
    pub fn log(table_id: &TableId) -> String {
        format!("{}{}", Self::LOG_PREFIX, table_id.as_str())
    }
}

/// Sentinel used in file and manifest keys for app-level (table-less) files.
pub const APP_LEVEL_SENTINEL: &str = "";
