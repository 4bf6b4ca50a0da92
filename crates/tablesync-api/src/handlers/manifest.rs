//! Manifest handlers.

use super::{blocking_failure, error_response};
use crate::identity::permissions_for;
use crate::models::ManifestResource;
use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;
use tablesync_commons::{TableId, TablePermission};
use tablesync_core::{AppContext, FileManifestManager, SyncError, TablesUserPermissions};

/// GET /v1/manifest, the app-level files.
pub async fn get_app_manifest(ctx: web::Data<Arc<AppContext>>) -> HttpResponse {
    let ctx = ctx.get_ref().clone();
    let result = web::block(move || {
        let manager = FileManifestManager::new(ctx);
        let manifest = manager.get_manifest_for_app_level_files()?;
        let etag = manager.get_app_level_manifest_etag()?;
        Ok::<_, SyncError>((manifest, etag))
    })
    .await;

    match result {
        Ok(Ok((manifest, manifest_etag))) => {
            HttpResponse::Ok().json(ManifestResource { files: manifest.files, manifest_etag })
        }
        Ok(Err(err)) => error_response(&err),
        Err(_) => blocking_failure(),
    }
}

/// GET /v1/tables/{tableId}/manifest
pub async fn get_table_manifest(
    req: HttpRequest,
    ctx: web::Data<Arc<AppContext>>,
    path: web::Path<String>,
) -> HttpResponse {
    let table_id = TableId::new(path.into_inner());
    let permissions = permissions_for(&req, ctx.get_ref());
    let ctx = ctx.get_ref().clone();

    let result = web::block(move || {
        permissions.check_permission(&table_id, TablePermission::Read)?;
        let manager = FileManifestManager::new(ctx);
        let manifest = manager.get_manifest_for_table(&table_id)?;
        let etag = manager.get_table_manifest_etag(&table_id)?;
        Ok::<_, SyncError>((manifest, etag))
    })
    .await;

    match result {
        Ok(Ok((manifest, manifest_etag))) => {
            HttpResponse::Ok().json(ManifestResource { files: manifest.files, manifest_etag })
        }
        Ok(Err(err)) => error_response(&err),
        Err(_) => blocking_failure(),
    }
}
