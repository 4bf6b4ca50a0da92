//! File manifest assembly and the cached aggregate digest.

use crate::app_context::AppContext;
use crate::error::Result;
use crate::etag;
use std::sync::Arc;
use tablesync_commons::{FileManifest, FileManifestEntry, TableId};
use tablesync_store::{EntityStore, LockPurpose};
use tablesync_tables::{FileKey, ManifestETagEntry, ManifestKey};

/// Lock resource for a manifest scope.
pub(crate) fn lock_resource(scope: Option<&TableId>) -> &str {
    match scope {
        Some(table_id) => table_id.as_str(),
        None => "app-level",
    }
}

pub(crate) fn manifest_key(scope: Option<&TableId>) -> ManifestKey {
    match scope {
        Some(table_id) => ManifestKey::Table(table_id.clone()),
        None => ManifestKey::AppLevel,
    }
}

/// Reads the live file records of a scope into sorted manifest entries.
///
/// Callers hold the non-permissions-change lock for the scope, so the
/// record set cannot shift under the read. Records that lost their content
/// hash or their blob are data-integrity damage: logged loudly and
/// excluded, never folded into the digest as empty bytes.
pub(crate) fn load_manifest_entries(
    ctx: &AppContext,
    scope: Option<&TableId>,
) -> Result<Vec<FileManifestEntry>> {
    let mut entries = Vec::new();
    for info in ctx.file_info().files_for_scope(scope)? {
        if info.deleted {
            continue;
        }
        if info.md5hash.is_none() {
            log::error!("file record {} has no content hash", info.path);
            continue;
        }
        let key = match &info.table_id {
            Some(table_id) => FileKey::table_level(table_id.clone(), info.path.clone()),
            None => FileKey::app_level(info.path.clone()),
        };
        if ctx.file_blobs().get(&key)?.is_none() {
            log::error!("file content not found for {}", info.path);
            continue;
        }
        entries.push(FileManifestEntry {
            filename: info.path,
            content_length: info.content_length,
            content_type: info.content_type,
            md5hash: info.md5hash,
            reduced_image_md5hash: None,
        });
    }
    entries.sort_by(|a, b| a.canonical_cmp(b));
    Ok(entries)
}

/// Assembles manifests and serves their cached aggregate digests.
pub struct FileManifestManager {
    ctx: Arc<AppContext>,
}

impl FileManifestManager {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Manifest of the files attached to one table.
    pub fn get_manifest_for_table(&self, table_id: &TableId) -> Result<FileManifest> {
        self.manifest_for_scope(Some(table_id))
    }

    /// Manifest of the app-level files (those not tied to a table).
    pub fn get_manifest_for_app_level_files(&self) -> Result<FileManifest> {
        self.manifest_for_scope(None)
    }

    fn manifest_for_scope(&self, scope: Option<&TableId>) -> Result<FileManifest> {
        let lease = self
            .ctx
            .locks()
            .acquire(lock_resource(scope), LockPurpose::NonPermissionsChange)?;
        let result = load_manifest_entries(&self.ctx, scope);
        self.ctx.locks().release(lease)?;
        Ok(FileManifest { files: result? })
    }

    /// Aggregate digest for a table's manifest, from cache when present.
    pub fn get_table_manifest_etag(&self, table_id: &TableId) -> Result<String> {
        self.manifest_etag_for(Some(table_id))
    }

    /// Aggregate digest for the app-level manifest, from cache when present.
    pub fn get_app_level_manifest_etag(&self) -> Result<String> {
        self.manifest_etag_for(None)
    }

    /// Cache slots are overwritten by file mutators as part of their own
    /// operation, so a hit is authoritative; only a missing slot triggers
    /// recomputation here.
    fn manifest_etag_for(&self, scope: Option<&TableId>) -> Result<String> {
        let key = manifest_key(scope);
        if let Some(cached) = self.ctx.manifest_etags().get(&key)? {
            return Ok(cached.manifest_etag);
        }

        let manifest = self.manifest_for_scope(scope)?;
        let digest = etag::manifest_etag(&manifest.files);
        self.ctx
            .manifest_etags()
            .put(&key, &ManifestETagEntry { manifest_etag: digest.clone() })?;
        Ok(digest)
    }
}
