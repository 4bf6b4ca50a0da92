//! Row read and mutation handlers.

use super::{blocking_failure, error_response, parse_cursor};
use crate::identity::permissions_for;
use crate::models::{
    effective_fetch_limit, DiffQuery, OutcomeType, PageQuery, RowList, RowOutcome,
    RowOutcomeList, RowResourceList,
};
use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;
use tablesync_commons::{Row, RowId, TableId};
use tablesync_core::{AppContext, DataManager, SyncError, TableManager};

/// GET /v1/tables/{tableId}/rows
pub async fn get_rows(
    req: HttpRequest,
    ctx: web::Data<Arc<AppContext>>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> HttpResponse {
    let table_id = TableId::new(path.into_inner());
    let cursor = match parse_cursor(query.cursor.as_ref()) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let limit = effective_fetch_limit(query.fetch_limit);
    let permissions = permissions_for(&req, ctx.get_ref());
    let ctx = ctx.get_ref().clone();

    let result = web::block(move || {
        let entry = TableManager::new(ctx.clone(), permissions.clone()).get_table(&table_id)?;
        let rows = DataManager::new(ctx, table_id, permissions).get_rows(cursor.as_ref(), limit)?;
        Ok::<_, SyncError>((entry, rows))
    })
    .await;

    match result {
        Ok(Ok((entry, page))) => HttpResponse::Ok().json(RowResourceList {
            rows: page.rows,
            websafe_resume_cursor: page.websafe_resume_cursor,
            has_more_results: page.has_more_results,
            data_etag: entry.data_etag,
        }),
        Ok(Err(err)) => error_response(&err),
        Err(_) => blocking_failure(),
    }
}

/// GET /v1/tables/{tableId}/rows/{rowId}
pub async fn get_row(
    req: HttpRequest,
    ctx: web::Data<Arc<AppContext>>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (table_id, row_id) = path.into_inner();
    let table_id = TableId::new(table_id);
    let row_id = RowId::new(row_id);
    let permissions = permissions_for(&req, ctx.get_ref());
    let ctx = ctx.get_ref().clone();

    let result =
        web::block(move || DataManager::new(ctx, table_id, permissions).get_row(&row_id)).await;

    match result {
        Ok(Ok(row)) => HttpResponse::Ok().json(row),
        Ok(Err(err)) => error_response(&err),
        Err(_) => blocking_failure(),
    }
}

/// GET /v1/tables/{tableId}/diff?dataETag=...
pub async fn get_rows_since(
    req: HttpRequest,
    ctx: web::Data<Arc<AppContext>>,
    path: web::Path<String>,
    query: web::Query<DiffQuery>,
) -> HttpResponse {
    let table_id = TableId::new(path.into_inner());
    let cursor = match parse_cursor(query.cursor.as_ref()) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let limit = effective_fetch_limit(query.fetch_limit);
    let permissions = permissions_for(&req, ctx.get_ref());
    let ctx = ctx.get_ref().clone();
    let query = query.into_inner();

    let result = web::block(move || {
        let entry = TableManager::new(ctx.clone(), permissions.clone()).get_table(&table_id)?;
        let rows = DataManager::new(ctx, table_id, permissions).get_rows_since(
            &query.data_etag,
            cursor.as_ref(),
            limit,
            query.include_deleted,
        )?;
        Ok::<_, SyncError>((entry, rows))
    })
    .await;

    match result {
        Ok(Ok((entry, page))) => HttpResponse::Ok().json(RowResourceList {
            rows: page.rows,
            websafe_resume_cursor: page.websafe_resume_cursor,
            has_more_results: page.has_more_results,
            data_etag: entry.data_etag,
        }),
        Ok(Err(err)) => error_response(&err),
        Err(_) => blocking_failure(),
    }
}

/// PUT /v1/tables/{tableId}/rows, batch row mutation.
///
/// Each row commits or fails on its own; the response reports one outcome
/// per submitted row, in submission order, so a client can tell "this row
/// conflicted" apart from "everything failed".
pub async fn alter_rows(
    req: HttpRequest,
    ctx: web::Data<Arc<AppContext>>,
    path: web::Path<String>,
    body: web::Json<RowList>,
) -> HttpResponse {
    let table_id = TableId::new(path.into_inner());
    let permissions = permissions_for(&req, ctx.get_ref());
    let ctx = ctx.get_ref().clone();
    let rows = body.into_inner().rows;

    let result = web::block(move || {
        let dm = DataManager::new(ctx, table_id, permissions);
        rows.iter().map(|row| apply_row_change(&dm, row)).collect::<Vec<_>>()
    })
    .await;

    match result {
        Ok(outcomes) => HttpResponse::Ok().json(RowOutcomeList { rows: outcomes }),
        Err(_) => blocking_failure(),
    }
}

fn apply_row_change(dm: &DataManager, row: &Row) -> RowOutcome {
    let row_id = row.row_id.as_str().to_string();
    let result = if row.deleted {
        match &row.row_etag {
            Some(etag) => dm.delete_row(&row.row_id, etag),
            None => {
                return RowOutcome {
                    row_id,
                    outcome: OutcomeType::Failed,
                    row: None,
                    error: Some("rowETag is required to delete a row".to_string()),
                }
            }
        }
    } else {
        dm.insert_or_update_row(row)
    };

    match result {
        Ok(row) => RowOutcome {
            row_id,
            outcome: OutcomeType::Success,
            row: Some(row),
            error: None,
        },
        Err(SyncError::PermissionDenied(_)) => RowOutcome {
            row_id,
            outcome: OutcomeType::Denied,
            row: None,
            error: None,
        },
        Err(err @ SyncError::ETagMismatch(_)) => RowOutcome {
            row_id,
            outcome: OutcomeType::InConflict,
            row: None,
            error: Some(err.to_string()),
        },
        Err(err) => RowOutcome {
            row_id,
            outcome: OutcomeType::Failed,
            row: None,
            error: Some(err.to_string()),
        },
    }
}
