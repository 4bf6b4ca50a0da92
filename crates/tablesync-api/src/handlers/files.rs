//! Synchronized file handlers.
//!
//! Files live at app level (no tableId query parameter) or table level.
//! Table-level operations are guarded by the table's ACL; app-level files
//! are served to any caller the upstream gateway admitted.

use super::{blocking_failure, error_response};
use crate::identity::permissions_for;
use crate::models::FileScopeQuery;
use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;
use tablesync_commons::{TableId, TablePermission};
use tablesync_core::{AppContext, FileManager, SyncError, TablesUserPermissions};

fn scope_from(query: &FileScopeQuery) -> Option<TableId> {
    query.table_id.as_ref().map(TableId::new)
}

fn check_scope(
    permissions: &Arc<dyn TablesUserPermissions>,
    scope: Option<&TableId>,
    permission: TablePermission,
) -> Result<(), SyncError> {
    match scope {
        Some(table_id) => permissions.check_permission(table_id, permission),
        None => Ok(()),
    }
}

/// GET /v1/files/{path}
pub async fn get_file(
    req: HttpRequest,
    ctx: web::Data<Arc<AppContext>>,
    path: web::Path<String>,
    query: web::Query<FileScopeQuery>,
) -> HttpResponse {
    let file_path = path.into_inner();
    let scope = scope_from(&query);
    let permissions = permissions_for(&req, ctx.get_ref());
    let ctx = ctx.get_ref().clone();

    let result = web::block(move || {
        check_scope(&permissions, scope.as_ref(), TablePermission::Read)?;
        FileManager::new(ctx).get_file(scope.as_ref(), &file_path)
    })
    .await;

    match result {
        Ok(Ok((info, content))) => {
            let mut response = HttpResponse::Ok();
            if let Some(content_type) = &info.content_type {
                response.content_type(content_type.as_str());
            }
            response.body(content)
        }
        Ok(Err(err)) => error_response(&err),
        Err(_) => blocking_failure(),
    }
}

/// PUT /v1/files/{path}
pub async fn put_file(
    req: HttpRequest,
    ctx: web::Data<Arc<AppContext>>,
    path: web::Path<String>,
    query: web::Query<FileScopeQuery>,
    body: web::Bytes,
) -> HttpResponse {
    let file_path = path.into_inner();
    let scope = scope_from(&query);
    let content_type = req
        .headers()
        .get(actix_web::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let permissions = permissions_for(&req, ctx.get_ref());
    let ctx = ctx.get_ref().clone();

    let result = web::block(move || {
        check_scope(&permissions, scope.as_ref(), TablePermission::Write)?;
        FileManager::new(ctx).put_file(scope.as_ref(), &file_path, content_type, &body)
    })
    .await;

    match result {
        Ok(Ok(info)) => HttpResponse::Created().json(info),
        Ok(Err(err)) => error_response(&err),
        Err(_) => blocking_failure(),
    }
}

/// DELETE /v1/files/{path}
pub async fn delete_file(
    req: HttpRequest,
    ctx: web::Data<Arc<AppContext>>,
    path: web::Path<String>,
    query: web::Query<FileScopeQuery>,
) -> HttpResponse {
    let file_path = path.into_inner();
    let scope = scope_from(&query);
    let permissions = permissions_for(&req, ctx.get_ref());
    let ctx = ctx.get_ref().clone();

    let result = web::block(move || {
        check_scope(&permissions, scope.as_ref(), TablePermission::Write)?;
        FileManager::new(ctx).delete_file(scope.as_ref(), &file_path)
    })
    .await;

    match result {
        Ok(Ok(())) => HttpResponse::NoContent().finish(),
        Ok(Err(err)) => error_response(&err),
        Err(_) => blocking_failure(),
    }
}
