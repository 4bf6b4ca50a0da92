//! Per-table current-state row store.

use std::sync::Arc;
use tablesync_commons::constants::Partitions;
use tablesync_commons::{Row, RowId, TableId};
use tablesync_store::{EntityStore, Partition, StorageBackend};

/// Store for the current state of every row of one table, keyed by row id.
///
/// One record per row; updates replace the record (history lives in the log
/// partition, never here). The record is the unit of optimistic
/// concurrency: the write path snapshots its raw bytes and commits with
/// `put_if_unchanged`.
#[derive(Clone)]
pub struct RowStore {
    backend: Arc<dyn StorageBackend>,
    partition: String,
}

impl RowStore {
    pub fn new(backend: Arc<dyn StorageBackend>, partition: impl Into<String>) -> Self {
        Self { backend, partition: partition.into() }
    }
}

impl EntityStore<RowId, Row> for RowStore {
    fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    fn partition(&self) -> &str {
        &self.partition
    }
}

/// Opens the row store for a table, ensuring its partition exists.
pub fn new_row_store(backend: Arc<dyn StorageBackend>, table_id: &TableId) -> RowStore {
    let partition_name = Partitions::rows(table_id);
    let _ = backend.create_partition(&Partition::new(partition_name.clone()));
    RowStore::new(backend, partition_name)
}
