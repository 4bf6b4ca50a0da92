//! Data model shared across the TableSync crates.

pub mod acl;
pub mod column;
pub mod cursor;
pub mod filter_scope;
pub mod log_entry;
pub mod manifest;
pub mod row;
pub mod scope;
pub mod table_entry;

pub use acl::{TableAcl, TablePermission, TableRole};
pub use column::ColumnDefinition;
pub use cursor::Cursor;
pub use filter_scope::{Access, FilterScope};
pub use log_entry::LogEntry;
pub use manifest::{FileInfo, FileManifest, FileManifestEntry};
pub use row::{Row, SavepointType};
pub use scope::{Scope, ScopeType};
pub use table_entry::TableEntry;
