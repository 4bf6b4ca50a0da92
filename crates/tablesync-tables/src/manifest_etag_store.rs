//! Persisted cache of aggregate manifest digests.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tablesync_commons::constants::{Partitions, APP_LEVEL_SENTINEL};
use tablesync_commons::{StorageKey, TableId};
use tablesync_store::{EntityStore, StorageBackend};

/// Cache key: one slot per table plus the app-level slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestKey {
    AppLevel,
    Table(TableId),
}

impl StorageKey for ManifestKey {
    fn storage_key(&self) -> Vec<u8> {
        match self {
            ManifestKey::AppLevel => APP_LEVEL_SENTINEL.as_bytes().to_vec(),
            ManifestKey::Table(id) => id.storage_key(),
        }
    }
}

/// Cached aggregate digest of one manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestETagEntry {
    pub manifest_etag: String,
}

/// Store for cached manifest ETags.
///
/// Entries are not invalidated by a TTL: file mutators overwrite the slot
/// as part of their own operation, and readers recompute on a miss. The
/// non-permissions-change lock bounds the staleness window.
#[derive(Clone)]
pub struct ManifestETagStore {
    backend: Arc<dyn StorageBackend>,
}

impl ManifestETagStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }
}

impl EntityStore<ManifestKey, ManifestETagEntry> for ManifestETagStore {
    fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    fn partition(&self) -> &str {
        Partitions::MANIFEST_ETAGS
    }
}
