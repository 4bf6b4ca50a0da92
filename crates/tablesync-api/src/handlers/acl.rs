//! ACL administration and caller-privileges handlers.

use super::{blocking_failure, error_response};
use crate::identity::{caller_identity, permissions_for};
use crate::models::{AclBody, AclResource, ErrorResponse, PrivilegesInfo};
use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;
use tablesync_commons::{Scope, TableId};
use tablesync_core::{AclManager, AppContext, TablesUserPermissions};

/// GET /v1/privileges: the caller's identity and scope set as this
/// service resolved them.
pub async fn get_privileges(req: HttpRequest, ctx: web::Data<Arc<AppContext>>) -> HttpResponse {
    let identity = caller_identity(&req);
    let permissions = permissions_for(&req, ctx.get_ref());
    HttpResponse::Ok().json(PrivilegesInfo {
        user_id: identity.user_id.as_str().to_string(),
        scopes: permissions.scopes().to_vec(),
    })
}

fn scope_from_parts(scope_type: &str, value: Option<&str>) -> Result<Scope, HttpResponse> {
    match (scope_type, value) {
        ("default", _) => Ok(Scope::default_scope()),
        ("user", Some(v)) if !v.is_empty() => Ok(Scope::user(v)),
        ("group", Some(v)) if !v.is_empty() => Ok(Scope::group(v)),
        _ => Err(HttpResponse::BadRequest().json(ErrorResponse::new(
            "bad_scope",
            format!("unrecognized acl scope {}", scope_type),
        ))),
    }
}

/// GET /v1/tables/{tableId}/acl
pub async fn get_acls(
    req: HttpRequest,
    ctx: web::Data<Arc<AppContext>>,
    path: web::Path<String>,
) -> HttpResponse {
    let table_id = TableId::new(path.into_inner());
    let permissions = permissions_for(&req, ctx.get_ref());
    let ctx = ctx.get_ref().clone();

    let result =
        web::block(move || AclManager::new(ctx, permissions).get_acls(&table_id)).await;

    match result {
        Ok(Ok(acls)) => HttpResponse::Ok().json(
            acls.into_iter()
                .map(|acl| AclResource { scope: acl.scope, role: acl.role })
                .collect::<Vec<_>>(),
        ),
        Ok(Err(err)) => error_response(&err),
        Err(_) => blocking_failure(),
    }
}

/// GET /v1/tables/{tableId}/acl/{scopeType}/{scopeValue}
pub async fn get_acl(
    req: HttpRequest,
    ctx: web::Data<Arc<AppContext>>,
    path: web::Path<(String, String, String)>,
) -> HttpResponse {
    let (table_id, scope_type, scope_value) = path.into_inner();
    let scope = match scope_from_parts(&scope_type, Some(scope_value.as_str())) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let table_id = TableId::new(table_id);
    let permissions = permissions_for(&req, ctx.get_ref());
    let ctx = ctx.get_ref().clone();

    let result =
        web::block(move || AclManager::new(ctx, permissions).get_acl(&table_id, &scope)).await;

    match result {
        Ok(Ok(acl)) => HttpResponse::Ok().json(AclResource { scope: acl.scope, role: acl.role }),
        Ok(Err(err)) => error_response(&err),
        Err(_) => blocking_failure(),
    }
}

/// PUT /v1/tables/{tableId}/acl/{scopeType}/{scopeValue}
pub async fn put_acl(
    req: HttpRequest,
    ctx: web::Data<Arc<AppContext>>,
    path: web::Path<(String, String, String)>,
    body: web::Json<AclBody>,
) -> HttpResponse {
    let (table_id, scope_type, scope_value) = path.into_inner();
    let scope = match scope_from_parts(&scope_type, Some(scope_value.as_str())) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let table_id = TableId::new(table_id);
    let role = body.into_inner().role;
    let permissions = permissions_for(&req, ctx.get_ref());
    let ctx = ctx.get_ref().clone();

    let result =
        web::block(move || AclManager::new(ctx, permissions).set_acl(&table_id, scope, role))
            .await;

    match result {
        Ok(Ok(acl)) => HttpResponse::Ok().json(AclResource { scope: acl.scope, role: acl.role }),
        Ok(Err(err)) => error_response(&err),
        Err(_) => blocking_failure(),
    }
}

/// DELETE /v1/tables/{tableId}/acl/{scopeType}/{scopeValue}
pub async fn delete_acl(
    req: HttpRequest,
    ctx: web::Data<Arc<AppContext>>,
    path: web::Path<(String, String, String)>,
) -> HttpResponse {
    let (table_id, scope_type, scope_value) = path.into_inner();
    let scope = match scope_from_parts(&scope_type, Some(scope_value.as_str())) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let table_id = TableId::new(table_id);
    let permissions = permissions_for(&req, ctx.get_ref());
    let ctx = ctx.get_ref().clone();

    let result =
        web::block(move || AclManager::new(ctx, permissions).delete_acl(&table_id, &scope)).await;

    match result {
        Ok(Ok(())) => HttpResponse::NoContent().finish(),
        Ok(Err(err)) => error_response(&err),
        Err(_) => blocking_failure(),
    }
}
