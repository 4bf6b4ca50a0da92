//! Synchronized file storage.
//!
//! Mutations run under the same non-permissions-change lock the manifest
//! readers take, and recompute the cached manifest digest before releasing
//! it, so cache staleness is bounded by the lock, not by a TTL.

use crate::app_context::AppContext;
use crate::error::{Result, SyncError};
use crate::etag;
use crate::manifest::{load_manifest_entries, lock_resource, manifest_key};
use std::sync::Arc;
use tablesync_commons::{FileInfo, TableId};
use tablesync_store::{EntityStore, LockPurpose};
use tablesync_tables::{FileKey, ManifestETagEntry};

/// Stores and serves synchronized files at app or table scope.
pub struct FileManager {
    ctx: Arc<AppContext>,
}

impl FileManager {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    fn file_key(scope: Option<&TableId>, path: &str) -> FileKey {
        match scope {
            Some(table_id) => FileKey::table_level(table_id.clone(), path),
            None => FileKey::app_level(path),
        }
    }

    /// Stores a file, overwriting any previous content at the path.
    pub fn put_file(
        &self,
        scope: Option<&TableId>,
        path: &str,
        content_type: Option<String>,
        content: &[u8],
    ) -> Result<FileInfo> {
        if path.is_empty() {
            return Err(SyncError::not_found("empty file path"));
        }
        if let Some(table_id) = scope {
            if self.ctx.table_entries().get(table_id)?.is_none() {
                return Err(SyncError::not_found(format!("table {}", table_id)));
            }
        }

        let lease = self
            .ctx
            .locks()
            .acquire(lock_resource(scope), LockPurpose::NonPermissionsChange)?;
        let result = self.put_file_locked(scope, path, content_type, content);
        self.ctx.locks().release(lease)?;
        result
    }

    fn put_file_locked(
        &self,
        scope: Option<&TableId>,
        path: &str,
        content_type: Option<String>,
        content: &[u8],
    ) -> Result<FileInfo> {
        let key = Self::file_key(scope, path);
        let info = FileInfo {
            table_id: scope.cloned(),
            path: path.to_string(),
            content_length: content.len() as u64,
            content_type,
            md5hash: Some(etag::content_md5(content)),
            deleted: false,
        };

        self.ctx.backend().batch(vec![
            self.ctx.file_info().put_op(&key, &info)?,
            self.ctx.file_blobs().put_op(&key, content),
        ])?;

        self.refresh_manifest_etag(scope)?;
        log::info!("stored file {} ({} bytes)", path, content.len());
        Ok(info)
    }

    /// Fetches a file's record and content.
    pub fn get_file(&self, scope: Option<&TableId>, path: &str) -> Result<(FileInfo, Vec<u8>)> {
        let key = Self::file_key(scope, path);
        let info = self
            .ctx
            .file_info()
            .get(&key)?
            .filter(|info| !info.deleted)
            .ok_or_else(|| SyncError::not_found(format!("file {}", path)))?;
        let content = self.ctx.file_blobs().get(&key)?.ok_or_else(|| {
            log::error!("file record {} exists but content is missing", path);
            SyncError::inconsistent_state(format!("file {} has no content", path))
        })?;
        Ok((info, content))
    }

    /// Deletes a file: tombstones the record, drops the content, and
    /// recomputes the manifest digest in the same locked operation.
    pub fn delete_file(&self, scope: Option<&TableId>, path: &str) -> Result<()> {
        let lease = self
            .ctx
            .locks()
            .acquire(lock_resource(scope), LockPurpose::NonPermissionsChange)?;
        let result = self.delete_file_locked(scope, path);
        self.ctx.locks().release(lease)?;
        result
    }

    fn delete_file_locked(&self, scope: Option<&TableId>, path: &str) -> Result<()> {
        let key = Self::file_key(scope, path);
        let info = self
            .ctx
            .file_info()
            .get(&key)?
            .filter(|info| !info.deleted)
            .ok_or_else(|| SyncError::not_found(format!("file {}", path)))?;

        let mut tombstone = info;
        tombstone.deleted = true;
        tombstone.md5hash = None;
        self.ctx.backend().batch(vec![
            self.ctx.file_info().put_op(&key, &tombstone)?,
            self.ctx.file_blobs().delete_op(&key),
        ])?;

        self.refresh_manifest_etag(scope)?;
        log::info!("deleted file {}", path);
        Ok(())
    }

    fn refresh_manifest_etag(&self, scope: Option<&TableId>) -> Result<()> {
        let entries = load_manifest_entries(&self.ctx, scope)?;
        let digest = etag::manifest_etag(&entries);
        self.ctx
            .manifest_etags()
            .put(&manifest_key(scope), &ManifestETagEntry { manifest_etag: digest })?;
        Ok(())
    }
}
