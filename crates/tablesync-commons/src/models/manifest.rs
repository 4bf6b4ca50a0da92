//! File manifests and the persisted file record.

use crate::ids::TableId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One file in a sync manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileManifestEntry {
    /// Relative path of the file within the app or table namespace.
    pub filename: String,
    pub content_length: u64,
    #[serde(default)]
    pub content_type: Option<String>,
    /// Content digest of the stored blob; absent only when the underlying
    /// record is damaged, in which case the entry is excluded from the
    /// aggregate digest.
    #[serde(default)]
    pub md5hash: Option<String>,
    #[serde(default)]
    pub reduced_image_md5hash: Option<String>,
}

impl FileManifestEntry {
    /// Canonical manifest order: by filename, then content hash. Total and
    /// deterministic, so equal entry multisets digest identically.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.filename
            .cmp(&other.filename)
            .then_with(|| self.md5hash.cmp(&other.md5hash))
    }
}

/// The sorted list of files synchronized for an app or table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileManifest {
    pub files: Vec<FileManifestEntry>,
}

/// Persisted record of one synchronized file.
///
/// `table_id = None` marks an app-level file. Deletion keeps a tombstone so
/// a concurrent manifest read never resurrects a half-removed record; the
/// blob itself is dropped immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub table_id: Option<TableId>,
    pub path: String,
    pub content_length: u64,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub md5hash: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}
