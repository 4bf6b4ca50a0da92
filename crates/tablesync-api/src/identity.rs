//! Caller identity resolution.
//!
//! Authentication itself happens upstream (a reverse proxy or gateway owns
//! credentials); by the time a request reaches this service the caller is
//! described by trusted headers. Absent headers mean the anonymous user,
//! which participates only in the default scope.

use actix_web::HttpRequest;
use std::sync::Arc;
use tablesync_commons::UserId;
use tablesync_core::{AclUserPermissions, AppContext, TablesUserPermissions};

/// Header carrying the authenticated user id.
pub const USER_HEADER: &str = "X-Sync-User";

/// Header carrying the caller's group names, comma-separated.
pub const GROUPS_HEADER: &str = "X-Sync-Groups";

pub const ANONYMOUS_USER: &str = "anonymous";

/// Resolved caller identity.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub user_id: UserId,
    pub groups: Vec<String>,
}

/// Reads the identity headers of a request.
pub fn caller_identity(req: &HttpRequest) -> CallerIdentity {
    let user_id = req
        .headers()
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .unwrap_or(ANONYMOUS_USER);
    let groups = req
        .headers()
        .get(GROUPS_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    CallerIdentity { user_id: UserId::new(user_id), groups }
}

/// Builds the permission surface for a request's caller.
pub fn permissions_for(
    req: &HttpRequest,
    ctx: &Arc<AppContext>,
) -> Arc<dyn TablesUserPermissions> {
    let identity = caller_identity(req);
    Arc::new(AclUserPermissions::new(
        identity.user_id,
        &identity.groups,
        ctx.acls().clone(),
    ))
}
