//! Table lifecycle handlers.

use super::{blocking_failure, error_response, parse_cursor};
use crate::identity::permissions_for;
use crate::models::{
    effective_fetch_limit, PageQuery, TableDefinition, TableResource, TableResourceList,
};
use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;
use tablesync_commons::TableId;
use tablesync_core::{AppContext, TableManager};

/// GET /v1/tables
pub async fn list_tables(
    req: HttpRequest,
    ctx: web::Data<Arc<AppContext>>,
    query: web::Query<PageQuery>,
) -> HttpResponse {
    let cursor = match parse_cursor(query.cursor.as_ref()) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let limit = effective_fetch_limit(query.fetch_limit);
    let permissions = permissions_for(&req, ctx.get_ref());
    let ctx = ctx.get_ref().clone();

    let result = web::block(move || {
        TableManager::new(ctx, permissions).list_tables(cursor.as_ref(), limit)
    })
    .await;

    match result {
        Ok(Ok(page)) => HttpResponse::Ok().json(TableResourceList {
            tables: page.tables.into_iter().map(TableResource::from).collect(),
            websafe_resume_cursor: page.websafe_resume_cursor,
            has_more_results: page.has_more_results,
        }),
        Ok(Err(err)) => error_response(&err),
        Err(_) => blocking_failure(),
    }
}

/// PUT /v1/tables/{tableId}
pub async fn create_table(
    req: HttpRequest,
    ctx: web::Data<Arc<AppContext>>,
    path: web::Path<String>,
    body: web::Json<TableDefinition>,
) -> HttpResponse {
    let table_id = TableId::new(path.into_inner());
    let permissions = permissions_for(&req, ctx.get_ref());
    let ctx = ctx.get_ref().clone();
    let columns = body.into_inner().columns;

    let result = web::block(move || {
        TableManager::new(ctx, permissions).create_table(&table_id, columns)
    })
    .await;

    match result {
        Ok(Ok(entry)) => HttpResponse::Ok().json(TableResource::from(entry)),
        Ok(Err(err)) => error_response(&err),
        Err(_) => blocking_failure(),
    }
}

/// GET /v1/tables/{tableId}
pub async fn get_table(
    req: HttpRequest,
    ctx: web::Data<Arc<AppContext>>,
    path: web::Path<String>,
) -> HttpResponse {
    let table_id = TableId::new(path.into_inner());
    let permissions = permissions_for(&req, ctx.get_ref());
    let ctx = ctx.get_ref().clone();

    let result =
        web::block(move || TableManager::new(ctx, permissions).get_table(&table_id)).await;

    match result {
        Ok(Ok(entry)) => HttpResponse::Ok().json(TableResource::from(entry)),
        Ok(Err(err)) => error_response(&err),
        Err(_) => blocking_failure(),
    }
}

/// DELETE /v1/tables/{tableId}
pub async fn delete_table(
    req: HttpRequest,
    ctx: web::Data<Arc<AppContext>>,
    path: web::Path<String>,
) -> HttpResponse {
    let table_id = TableId::new(path.into_inner());
    let permissions = permissions_for(&req, ctx.get_ref());
    let ctx = ctx.get_ref().clone();

    let result =
        web::block(move || TableManager::new(ctx, permissions).delete_table(&table_id)).await;

    match result {
        Ok(Ok(())) => HttpResponse::NoContent().finish(),
        Ok(Err(err)) => error_response(&err),
        Err(_) => blocking_failure(),
    }
}
