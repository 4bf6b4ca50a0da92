//! Per-table append-only log store.

use std::sync::Arc;
use tablesync_commons::constants::Partitions;
use tablesync_commons::{LogEntry, SequenceValue, TableId};
use tablesync_store::{EntityStore, Partition, StorageBackend};

/// Store for one table's mutation log, keyed by sequence value.
///
/// Entries are written once and never updated; the big-endian sequence key
/// makes an ascending scan of the partition the authoritative mutation
/// order, which is what "changes since" queries page over. Entries are only
/// ever removed wholesale, when the table is deleted.
#[derive(Clone)]
pub struct LogStore {
    backend: Arc<dyn StorageBackend>,
    partition: String,
}

impl LogStore {
    pub fn new(backend: Arc<dyn StorageBackend>, partition: impl Into<String>) -> Self {
        Self { backend, partition: partition.into() }
    }
}

impl EntityStore<SequenceValue, LogEntry> for LogStore {
    fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    fn partition(&self) -> &str {
        &self.partition
    }
}

/// Opens the log store for a table, ensuring its partition exists.
pub fn new_log_store(backend: Arc<dyn StorageBackend>, table_id: &TableId) -> LogStore {
    let partition_name = Partitions::log(table_id);
    let _ = backend.create_partition(&Partition::new(partition_name.clone()));
    LogStore::new(backend, partition_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use tablesync_commons::{FilterScope, Row, RowId, SavepointType};
    use tablesync_store::InMemoryBackend;

    fn log_entry(seq: i64, row_id: &str) -> LogEntry {
        let mut row = Row::for_insert(
            RowId::new(row_id),
            None,
            None,
            SavepointType::Complete,
            Utc::now(),
            None,
            FilterScope::empty(),
            BTreeMap::new(),
        );
        row.row_etag = Some(format!("etag-{}", seq));
        LogEntry::new(SequenceValue::new(seq), None, row)
    }

    #[test]
    fn test_scan_returns_sequence_order() {
        let backend: Arc<dyn StorageBackend> = Arc::new(InMemoryBackend::new());
        let store = new_log_store(backend, &TableId::new("people"));

        for seq in [3, 1, 2] {
            let entry = log_entry(seq, "r");
            store.put(&entry.sequence_value, &entry).unwrap();
        }

        let seqs: Vec<i64> = store
            .scan_page(None, None, None)
            .unwrap()
            .into_iter()
            .map(|(_, e)| e.sequence_value.as_i64())
            .collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[test]
    fn test_scan_from_boundary_is_exclusive_of_it() {
        let backend: Arc<dyn StorageBackend> = Arc::new(InMemoryBackend::new());
        let store = new_log_store(backend, &TableId::new("people"));
        for seq in 1..=4 {
            let entry = log_entry(seq, "r");
            store.put(&entry.sequence_value, &entry).unwrap();
        }

        // resume strictly after sequence 2
        let start = SequenceValue::new(2).next().to_bytes();
        let seqs: Vec<i64> = store
            .scan_page(None, Some(&start), None)
            .unwrap()
            .into_iter()
            .map(|(_, e)| e.sequence_value.as_i64())
            .collect();
        assert_eq!(seqs, vec![3, 4]);
    }
}
