//! # tablesync-commons
//!
//! Shared types and constants for TableSync.
//!
//! This crate provides the foundational model types used across all TableSync
//! crates (tablesync-store, tablesync-tables, tablesync-core, tablesync-api):
//! typed identifiers, the row/log/table-entry data model, access-control
//! descriptors, and the websafe continuation cursor. It deliberately carries
//! no storage or HTTP dependencies so the higher layers cannot form cycles
//! through it.

pub mod constants;
pub mod ids;
pub mod models;
pub mod storage_key;

// Re-export commonly used types at crate root
pub use ids::{RowId, SequenceValue, TableId, UserId};
pub use models::{
    Access, ColumnDefinition, Cursor, FileInfo, FileManifest, FileManifestEntry, FilterScope,
    LogEntry, Row, SavepointType, Scope, ScopeType, TableAcl, TableEntry, TablePermission,
    TableRole,
};
pub use storage_key::StorageKey;
