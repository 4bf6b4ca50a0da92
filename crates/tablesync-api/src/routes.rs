//! API routes configuration.
//!
//! All endpoints use the /v1 version prefix. Caller identity arrives in
//! the `X-Sync-User` / `X-Sync-Groups` headers (see `identity`).

use crate::handlers::{acl, files, manifest, rows, tables};
use actix_web::{web, HttpResponse};
use serde_json::json;

/// Configure API routes for TableSync.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v1")
            .route("/healthcheck", web::get().to(healthcheck_handler))
            .route("/privileges", web::get().to(acl::get_privileges))
            .route("/manifest", web::get().to(manifest::get_app_manifest))
            .route("/tables", web::get().to(tables::list_tables))
            .route("/tables/{tableId}", web::put().to(tables::create_table))
            .route("/tables/{tableId}", web::get().to(tables::get_table))
            .route("/tables/{tableId}", web::delete().to(tables::delete_table))
            .route("/tables/{tableId}/rows", web::get().to(rows::get_rows))
            .route("/tables/{tableId}/rows", web::put().to(rows::alter_rows))
            .route("/tables/{tableId}/rows/{rowId}", web::get().to(rows::get_row))
            .route("/tables/{tableId}/diff", web::get().to(rows::get_rows_since))
            .route("/tables/{tableId}/manifest", web::get().to(manifest::get_table_manifest))
            .route("/tables/{tableId}/acl", web::get().to(acl::get_acls))
            .route(
                "/tables/{tableId}/acl/{scopeType}/{scopeValue}",
                web::get().to(acl::get_acl),
            )
            .route(
                "/tables/{tableId}/acl/{scopeType}/{scopeValue}",
                web::put().to(acl::put_acl),
            )
            .route(
                "/tables/{tableId}/acl/{scopeType}/{scopeValue}",
                web::delete().to(acl::delete_acl),
            )
            .route("/files/{path:.*}", web::get().to(files::get_file))
            .route("/files/{path:.*}", web::put().to(files::put_file))
            .route("/files/{path:.*}", web::delete().to(files::delete_file)),
    );
}

/// Health check endpoint handler.
async fn healthcheck_handler() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
    }))
}
