//! Shared service context.

use std::sync::Arc;
use tablesync_store::{LockManager, Sequencer, StorageBackend};
use tablesync_tables::{
    AclStore, ColumnDefsStore, FileBlobStore, FileInfoStore, ManifestETagStore, TableEntryStore,
};

/// One long-lived instance owns every store handle and the shared
/// sequencer/lock state; managers borrow it per request. Nothing in here is
/// per-request or per-caller.
pub struct AppContext {
    backend: Arc<dyn StorageBackend>,
    sequencer: Sequencer,
    locks: LockManager,
    table_entries: TableEntryStore,
    column_defs: ColumnDefsStore,
    acls: AclStore,
    file_info: FileInfoStore,
    file_blobs: FileBlobStore,
    manifest_etags: ManifestETagStore,
}

impl AppContext {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            sequencer: Sequencer::new(backend.clone()),
            locks: LockManager::new(backend.clone()),
            table_entries: TableEntryStore::new(backend.clone()),
            column_defs: ColumnDefsStore::new(backend.clone()),
            acls: AclStore::new(backend.clone()),
            file_info: FileInfoStore::new(backend.clone()),
            file_blobs: FileBlobStore::new(backend.clone()),
            manifest_etags: ManifestETagStore::new(backend.clone()),
            backend,
        }
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn locks(&self) -> &LockManager {
        &self.locks
    }

    pub fn table_entries(&self) -> &TableEntryStore {
        &self.table_entries
    }

    pub fn column_defs(&self) -> &ColumnDefsStore {
        &self.column_defs
    }

    pub fn acls(&self) -> &AclStore {
        &self.acls
    }

    pub fn file_info(&self) -> &FileInfoStore {
        &self.file_info
    }

    pub fn file_blobs(&self) -> &FileBlobStore {
        &self.file_blobs
    }

    pub fn manifest_etags(&self) -> &ManifestETagStore {
        &self.manifest_etags
    }
}
