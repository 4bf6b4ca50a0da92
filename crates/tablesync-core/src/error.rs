// Error taxonomy for the sync protocol.
use tablesync_store::StorageError;
use thiserror::Error;

/// Main error type for TableSync operations.
///
/// Validation failures (`BadColumnName`) are raised before any mutation is
/// attempted, so a rejected request never leaves a partial write.
/// `ETagMismatch` tells the client to refetch; `TransientConflict` and lock
/// timeouts tell it to retry the same request.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Table already exists: {0}")]
    TableAlreadyExists(String),

    #[error("ETag mismatch: {0}")]
    ETagMismatch(String),

    #[error("Bad column name: {0}")]
    BadColumnName(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Table metadata and row store disagree. Fatal for the request and
    /// logged loudly; never retried.
    #[error("Inconsistent state: {0}")]
    InconsistentState(String),

    /// Same-record CAS retries exhausted under contention. Retryable.
    #[error("Transient conflict: {0}")]
    TransientConflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SyncError {
    /// Whether the caller may safely retry the identical request.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::TransientConflict(_) => true,
            SyncError::Storage(StorageError::LockTimeout(_)) => true,
            SyncError::Storage(StorageError::IoError(_)) => true,
            _ => false,
        }
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        SyncError::PermissionDenied(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        SyncError::NotFound(msg.into())
    }

    pub fn inconsistent_state(msg: impl Into<String>) -> Self {
        SyncError::InconsistentState(msg.into())
    }
}

/// Result type alias using SyncError.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(SyncError::TransientConflict("row 1".into()).is_retryable());
        assert!(SyncError::Storage(StorageError::LockTimeout("m".into())).is_retryable());
        assert!(!SyncError::ETagMismatch("row 1".into()).is_retryable());
        assert!(!SyncError::BadColumnName("_id".into()).is_retryable());
        assert!(!SyncError::PermissionDenied("nope".into()).is_retryable());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            SyncError::not_found("table people").to_string(),
            "Not found: table people"
        );
        assert_eq!(
            SyncError::ETagMismatch("row 1".to_string()).to_string(),
            "ETag mismatch: row 1"
        );
    }
}
