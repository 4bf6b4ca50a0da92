//! Store for column definition sets.

use std::sync::Arc;
use tablesync_commons::constants::Partitions;
use tablesync_commons::{ColumnDefinition, StorageKey, TableId};
use tablesync_store::{EntityStore, StorageBackend};

/// Key of a column set: one persisted record per (table, schema ETag).
///
/// Keeping the whole set in one record makes schema reads and writes atomic
/// and leaves superseded sets addressable during a schema migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSetKey {
    pub table_id: TableId,
    pub schema_etag: String,
}

impl ColumnSetKey {
    pub fn new(table_id: TableId, schema_etag: impl Into<String>) -> Self {
        Self { table_id, schema_etag: schema_etag.into() }
    }
}

impl StorageKey for ColumnSetKey {
    fn storage_key(&self) -> Vec<u8> {
        let mut key = self.table_id.storage_key();
        key.push(b':');
        key.extend_from_slice(self.schema_etag.as_bytes());
        key
    }
}

/// Store for [`ColumnDefinition`] sets.
#[derive(Clone)]
pub struct ColumnDefsStore {
    backend: Arc<dyn StorageBackend>,
}

impl ColumnDefsStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Prefix covering every schema version of a table.
    pub fn table_prefix(table_id: &TableId) -> Vec<u8> {
        let mut prefix = table_id.storage_key();
        prefix.push(b':');
        prefix
    }
}

impl EntityStore<ColumnSetKey, Vec<ColumnDefinition>> for ColumnDefsStore {
    fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    fn partition(&self) -> &str {
        Partitions::COLUMN_DEFINITIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablesync_store::InMemoryBackend;

    #[test]
    fn test_column_sets_keyed_by_schema_etag() {
        let store = ColumnDefsStore::new(Arc::new(InMemoryBackend::new()));
        let table = TableId::new("people");

        let v1 = vec![ColumnDefinition::new("name", "string")];
        let v2 = vec![
            ColumnDefinition::new("name", "string"),
            ColumnDefinition::new("age", "integer"),
        ];
        store.put(&ColumnSetKey::new(table.clone(), "s1"), &v1).unwrap();
        store.put(&ColumnSetKey::new(table.clone(), "s2"), &v2).unwrap();

        assert_eq!(store.get(&ColumnSetKey::new(table.clone(), "s1")).unwrap(), Some(v1));
        assert_eq!(store.get(&ColumnSetKey::new(table.clone(), "s2")).unwrap(), Some(v2));

        let all = store
            .scan_page(Some(&ColumnDefsStore::table_prefix(&table)), None, None)
            .unwrap();
        assert_eq!(all.len(), 2);
    }
}
