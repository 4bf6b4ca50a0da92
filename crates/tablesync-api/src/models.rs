//! Request and response models for the REST layer.

use serde::{Deserialize, Serialize};
use tablesync_commons::{
    ColumnDefinition, FileManifestEntry, Row, Scope, TableEntry, TableRole,
};

/// Default page size when the client doesn't ask for one.
pub const DEFAULT_FETCH_LIMIT: usize = 500;

/// Upper bound on client-requested page sizes.
pub const MAX_FETCH_LIMIT: usize = 2000;

/// Clamps a requested fetch limit into the allowed range.
pub fn effective_fetch_limit(requested: Option<usize>) -> usize {
    requested.unwrap_or(DEFAULT_FETCH_LIMIT).clamp(1, MAX_FETCH_LIMIT)
}

/// Body of a table-creation request.
#[derive(Debug, Deserialize)]
pub struct TableDefinition {
    pub columns: Vec<ColumnDefinition>,
}

/// Table entry as returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableResource {
    pub table_id: String,
    pub schema_etag: Option<String>,
    pub data_etag: String,
}

impl From<TableEntry> for TableResource {
    fn from(entry: TableEntry) -> Self {
        Self {
            table_id: entry.table_id.as_str().to_string(),
            schema_etag: entry.schema_etag,
            data_etag: entry.data_etag,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableResourceList {
    pub tables: Vec<TableResource>,
    pub websafe_resume_cursor: Option<String>,
    pub has_more_results: bool,
}

/// Batch of row change-requests.
#[derive(Debug, Deserialize)]
pub struct RowList {
    pub rows: Vec<Row>,
}

/// Per-row outcome of a batch mutation. Each row commits or fails
/// independently; there is no batch-wide transaction.
#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeType {
    Success,
    Denied,
    InConflict,
    Failed,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowOutcome {
    pub row_id: String,
    pub outcome: OutcomeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<Row>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowOutcomeList {
    pub rows: Vec<RowOutcome>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowResourceList {
    pub rows: Vec<Row>,
    pub websafe_resume_cursor: Option<String>,
    pub has_more_results: bool,
    pub data_etag: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestResource {
    pub files: Vec<FileManifestEntry>,
    pub manifest_etag: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivilegesInfo {
    pub user_id: String,
    pub scopes: Vec<Scope>,
}

#[derive(Debug, Deserialize)]
pub struct AclBody {
    pub role: TableRole,
}

#[derive(Debug, Serialize)]
pub struct AclResource {
    pub scope: Scope,
    pub role: TableRole,
}

/// Query parameters for paginated listings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub cursor: Option<String>,
    pub fetch_limit: Option<usize>,
}

/// Query parameters for the rows-since (diff) endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffQuery {
    pub data_etag: String,
    pub cursor: Option<String>,
    pub fetch_limit: Option<usize>,
    #[serde(default)]
    pub include_deleted: bool,
}

/// Query parameter selecting a table scope for file operations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileScopeQuery {
    pub table_id: Option<String>,
}

/// Uniform error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &'static str, message: impl Into<String>) -> Self {
        Self { error, message: message.into() }
    }
}
