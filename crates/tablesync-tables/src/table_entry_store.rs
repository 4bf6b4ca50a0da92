//! Store for table entries.

use std::sync::Arc;
use tablesync_commons::constants::Partitions;
use tablesync_commons::{TableEntry, TableId};
use tablesync_store::{EntityStore, StorageBackend};

/// Store for [`TableEntry`] records, keyed by table id.
///
/// The entry record is the coarse CAS domain of the write path: every row
/// mutation swaps in a fresh data ETag via `put_if_unchanged`, so high
/// write concurrency on one table is bounded by this single hot record.
/// That is a deliberate simplicity/throughput tradeoff, not an accident.
#[derive(Clone)]
pub struct TableEntryStore {
    backend: Arc<dyn StorageBackend>,
}

impl TableEntryStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }
}

impl EntityStore<TableId, TableEntry> for TableEntryStore {
    fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    fn partition(&self) -> &str {
        Partitions::TABLE_ENTRIES
    }
}
