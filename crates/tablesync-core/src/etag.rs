//! ETag generation and manifest digests.
//!
//! Two independent concerns share this module:
//! - opaque version tokens for rows, schemas, and table data: globally
//!   unique, unordered, compared only for equality
//! - the deterministic aggregate digest of a file manifest, which clients
//!   compare literally byte-for-byte against their cached copy

use md5::{Digest, Md5};
use tablesync_commons::FileManifestEntry;

/// Digest of the empty manifest. Public because clients hold it as the
/// "nothing synced yet" sentinel; must match across implementations.
pub const EMPTY_MANIFEST_ETAG: &str = "d41d8cd98f00b204e9800998ecf8427e";

/// Generates a fresh opaque version token.
///
/// No ordering semantics: callers must never compare tokens for anything
/// but equality.
pub fn new_etag() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Content hash of a stored blob, lowercase hex.
pub fn content_md5(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}

/// Aggregate digest over a manifest entry set.
///
/// Entries are sorted into the canonical (filename, content hash) order
/// first, so any two orderings of the same entry multiset digest
/// identically. The hash input is each entry's content-hash *string* in
/// UTF-8; an entry with no content hash is a damaged record and is excluded
/// (not folded in as zero bytes), with a data-integrity warning.
pub fn manifest_etag(entries: &[FileManifestEntry]) -> String {
    let mut sorted: Vec<&FileManifestEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.canonical_cmp(b));

    let mut hasher = Md5::new();
    for entry in sorted {
        match &entry.md5hash {
            Some(hash) => hasher.update(hash.as_bytes()),
            None => {
                log::warn!(
                    "manifest entry {} has no content hash; excluded from digest",
                    entry.filename
                );
            }
        }
    }
    unsigned_hex(&hasher.finalize())
}

/// Hex form of an unsigned big integer: lowercase, leading zeros stripped.
/// Existing clients compare digests in this exact form.
fn unsigned_hex(digest: &[u8]) -> String {
    let full = hex::encode(digest);
    let trimmed = full.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
