//! HTTP handlers.
//!
//! Handlers are thin: resolve the caller, decode inputs, run a manager on
//! the blocking pool (managers are synchronous and may wait on advisory
//! locks), and map the result. All protocol errors flow through
//! [`error_response`] so status codes stay consistent across endpoints.

pub mod acl;
pub mod files;
pub mod manifest;
pub mod rows;
pub mod tables;

use crate::models::ErrorResponse;
use actix_web::HttpResponse;
use tablesync_commons::Cursor;
use tablesync_core::SyncError;
use tablesync_store::StorageError;

/// Maps a protocol error to its HTTP response.
///
/// Retryable conditions (lock timeouts, CAS exhaustion) become 503 so
/// clients know to repeat the identical request; 412 tells them to refetch
/// first.
pub fn error_response(err: &SyncError) -> HttpResponse {
    match err {
        SyncError::PermissionDenied(_) => {
            // generic body; denial must not describe what exists
            HttpResponse::Forbidden().json(ErrorResponse::new("permission_denied", "denied"))
        }
        SyncError::NotFound(msg) => {
            HttpResponse::NotFound().json(ErrorResponse::new("not_found", msg.clone()))
        }
        SyncError::TableAlreadyExists(msg) => {
            HttpResponse::Conflict().json(ErrorResponse::new("table_already_exists", msg.clone()))
        }
        SyncError::ETagMismatch(msg) => HttpResponse::PreconditionFailed()
            .json(ErrorResponse::new("etag_mismatch", msg.clone())),
        SyncError::BadColumnName(msg) => {
            HttpResponse::BadRequest().json(ErrorResponse::new("bad_column_name", msg.clone()))
        }
        SyncError::InvalidInput(msg) => {
            HttpResponse::BadRequest().json(ErrorResponse::new("invalid_input", msg.clone()))
        }
        SyncError::TransientConflict(msg) => HttpResponse::ServiceUnavailable()
            .json(ErrorResponse::new("transient_conflict", msg.clone())),
        SyncError::Storage(StorageError::LockTimeout(msg)) => HttpResponse::ServiceUnavailable()
            .json(ErrorResponse::new("lock_timeout", msg.clone())),
        SyncError::InconsistentState(msg) => {
            log::error!("inconsistent state: {}", msg);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new("internal_error", msg.clone()))
        }
        SyncError::Storage(e) => {
            log::error!("storage error: {}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new("internal_error", "storage failure"))
        }
    }
}

/// Parses an optional websafe cursor, mapping garbage to a 400.
pub(crate) fn parse_cursor(raw: Option<&String>) -> Result<Option<Cursor>, HttpResponse> {
    match raw {
        None => Ok(None),
        Some(s) => Cursor::from_websafe_string(s).map(Some).map_err(|e| {
            HttpResponse::BadRequest().json(ErrorResponse::new("bad_cursor", e))
        }),
    }
}

/// Response for a blocking-pool failure (task cancelled at shutdown).
pub(crate) fn blocking_failure() -> HttpResponse {
    HttpResponse::InternalServerError()
        .json(ErrorResponse::new("internal_error", "request task failed"))
}
