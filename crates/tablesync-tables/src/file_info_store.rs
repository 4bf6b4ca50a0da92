//! Stores for synchronized file records and their content.

use std::sync::Arc;
use tablesync_commons::constants::{Partitions, APP_LEVEL_SENTINEL};
use tablesync_commons::{FileInfo, StorageKey, TableId};
use tablesync_store::{EntityStore, Operation, Partition, Result, StorageBackend};

/// Key of a synchronized file: (app-level or table scope, relative path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileKey {
    pub table_id: Option<TableId>,
    pub path: String,
}

impl FileKey {
    pub fn app_level(path: impl Into<String>) -> Self {
        Self { table_id: None, path: path.into() }
    }

    pub fn table_level(table_id: TableId, path: impl Into<String>) -> Self {
        Self { table_id: Some(table_id), path: path.into() }
    }

    fn scope_str(&self) -> &str {
        match &self.table_id {
            Some(id) => id.as_str(),
            None => APP_LEVEL_SENTINEL,
        }
    }
}

impl StorageKey for FileKey {
    fn storage_key(&self) -> Vec<u8> {
        let mut key = self.scope_str().as_bytes().to_vec();
        key.push(b':');
        key.extend_from_slice(self.path.as_bytes());
        key
    }
}

/// Store for [`FileInfo`] metadata records.
#[derive(Clone)]
pub struct FileInfoStore {
    backend: Arc<dyn StorageBackend>,
}

impl FileInfoStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Prefix covering every file of a scope (a table, or app-level).
    pub fn scope_prefix(table_id: Option<&TableId>) -> Vec<u8> {
        let scope = match table_id {
            Some(id) => id.as_str(),
            None => APP_LEVEL_SENTINEL,
        };
        let mut prefix = scope.as_bytes().to_vec();
        prefix.push(b':');
        prefix
    }

    /// All file records of a scope, tombstones included.
    pub fn files_for_scope(&self, table_id: Option<&TableId>) -> Result<Vec<FileInfo>> {
        Ok(self
            .scan_page(Some(&Self::scope_prefix(table_id)), None, None)?
            .into_iter()
            .map(|(_, info)| info)
            .collect())
    }
}

impl EntityStore<FileKey, FileInfo> for FileInfoStore {
    fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    fn partition(&self) -> &str {
        Partitions::FILE_INFO
    }
}

/// Store for the raw content of synchronized files.
///
/// Content is addressed by the same key as its [`FileInfo`] record and is
/// stored as raw bytes, not JSON.
#[derive(Clone)]
pub struct FileBlobStore {
    backend: Arc<dyn StorageBackend>,
}

impl FileBlobStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    fn partition(&self) -> Partition {
        Partition::new(Partitions::FILE_BLOBS)
    }

    pub fn get(&self, key: &FileKey) -> Result<Option<Vec<u8>>> {
        self.backend.get(&self.partition(), &key.storage_key())
    }

    /// Batch operation writing the blob, for composing with the metadata put.
    pub fn put_op(&self, key: &FileKey, content: &[u8]) -> Operation {
        Operation::Put {
            partition: self.partition(),
            key: key.storage_key(),
            value: content.to_vec(),
        }
    }

    /// Batch operation dropping the blob.
    pub fn delete_op(&self, key: &FileKey) -> Operation {
        Operation::Delete { partition: self.partition(), key: key.storage_key() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablesync_store::InMemoryBackend;

    fn info(key: &FileKey, hash: &str) -> FileInfo {
        FileInfo {
            table_id: key.table_id.clone(),
            path: key.path.clone(),
            content_length: 4,
            content_type: Some("text/plain".to_string()),
            md5hash: Some(hash.to_string()),
            deleted: false,
        }
    }

    #[test]
    fn test_app_and_table_scopes_are_disjoint() {
        let store = FileInfoStore::new(Arc::new(InMemoryBackend::new()));
        let app_key = FileKey::app_level("index.html");
        let table_key = FileKey::table_level(TableId::new("people"), "forms/person.xml");

        store.put(&app_key, &info(&app_key, "h1")).unwrap();
        store.put(&table_key, &info(&table_key, "h2")).unwrap();

        let app_files = store.files_for_scope(None).unwrap();
        assert_eq!(app_files.len(), 1);
        assert_eq!(app_files[0].path, "index.html");

        let table = TableId::new("people");
        let table_files = store.files_for_scope(Some(&table)).unwrap();
        assert_eq!(table_files.len(), 1);
        assert_eq!(table_files[0].path, "forms/person.xml");
    }

    #[test]
    fn test_blob_roundtrip_via_batch() {
        let backend: Arc<dyn StorageBackend> = Arc::new(InMemoryBackend::new());
        let blobs = FileBlobStore::new(backend.clone());
        let key = FileKey::app_level("index.html");

        backend.batch(vec![blobs.put_op(&key, b"<html/>")]).unwrap();
        assert_eq!(blobs.get(&key).unwrap(), Some(b"<html/>".to_vec()));

        backend.batch(vec![blobs.delete_op(&key)]).unwrap();
        assert_eq!(blobs.get(&key).unwrap(), None);
    }
}
