//! HTTP round-trip tests over the in-memory backend.

use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;
use tablesync_api::identity::{GROUPS_HEADER, USER_HEADER};
use tablesync_api::routes::configure_routes;
use tablesync_core::AppContext;
use tablesync_store::InMemoryBackend;

fn app_ctx() -> Arc<AppContext> {
    Arc::new(AppContext::new(Arc::new(InMemoryBackend::new())))
}

macro_rules! service {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($ctx.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

fn people_definition() -> Value {
    json!({
        "columns": [
            {"elementKey": "name", "elementType": "string"},
            {"elementKey": "age", "elementType": "integer"}
        ]
    })
}

fn row_json(row_id: &str, name: &str, age: &str, etag: Option<&str>) -> Value {
    let mut row = json!({
        "rowId": row_id,
        "savepointType": "COMPLETE",
        "savepointTimestamp": "2024-03-01T10:00:00Z",
        "values": {"name": name, "age": age}
    });
    if let Some(etag) = etag {
        row["rowEtag"] = json!(etag);
    }
    row
}

#[actix_web::test]
async fn test_healthcheck_reports_healthy() {
    let ctx = app_ctx();
    let app = service!(ctx);
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/v1/healthcheck").to_request(),
    )
    .await;
    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_table_create_insert_and_read_back() {
    let ctx = app_ctx();
    let app = service!(ctx);

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/v1/tables/people")
            .insert_header((USER_HEADER, "alice"))
            .set_json(people_definition())
            .to_request(),
    )
    .await;
    assert!(resp.status().is_success());
    let table: Value = test::read_body_json(resp).await;
    assert_eq!(table["tableId"], "people");
    assert!(table["schemaEtag"].is_string());

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/v1/tables/people/rows")
            .insert_header((USER_HEADER, "alice"))
            .set_json(json!({"rows": [row_json("1", "dylan", "23", None)]}))
            .to_request(),
    )
    .await;
    assert!(resp.status().is_success());
    let outcomes: Value = test::read_body_json(resp).await;
    assert_eq!(outcomes["rows"][0]["outcome"], "SUCCESS");
    let row_etag = outcomes["rows"][0]["row"]["rowEtag"].as_str().unwrap().to_string();

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/v1/tables/people/rows")
            .insert_header((USER_HEADER, "alice"))
            .to_request(),
    )
    .await;
    assert!(resp.status().is_success());
    let page: Value = test::read_body_json(resp).await;
    assert_eq!(page["rows"].as_array().unwrap().len(), 1);
    assert_eq!(page["rows"][0]["rowEtag"], row_etag.as_str());
    assert_eq!(page["rows"][0]["values"]["name"], "dylan");
}

#[actix_web::test]
async fn test_stale_etag_conflict_reports_in_conflict() {
    let ctx = app_ctx();
    let app = service!(ctx);

    test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/v1/tables/people")
            .insert_header((USER_HEADER, "alice"))
            .set_json(people_definition())
            .to_request(),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/v1/tables/people/rows")
            .insert_header((USER_HEADER, "alice"))
            .set_json(json!({"rows": [row_json("1", "dylan", "23", None)]}))
            .to_request(),
    )
    .await;
    let outcomes: Value = test::read_body_json(resp).await;
    assert_eq!(outcomes["rows"][0]["outcome"], "SUCCESS");

    // stale etag and different values: conflict, original row intact
    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/v1/tables/people/rows")
            .insert_header((USER_HEADER, "alice"))
            .set_json(json!({"rows": [row_json("1", "dylan", "99", Some("stale-etag"))]}))
            .to_request(),
    )
    .await;
    let outcomes: Value = test::read_body_json(resp).await;
    assert_eq!(outcomes["rows"][0]["outcome"], "IN_CONFLICT");

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/v1/tables/people/rows/1")
            .insert_header((USER_HEADER, "alice"))
            .to_request(),
    )
    .await;
    let row: Value = test::read_body_json(resp).await;
    assert_eq!(row["values"]["age"], "23");
}

#[actix_web::test]
async fn test_acl_gates_other_users() {
    let ctx = app_ctx();
    let app = service!(ctx);

    test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/v1/tables/people")
            .insert_header((USER_HEADER, "alice"))
            .set_json(people_definition())
            .to_request(),
    )
    .await;

    // bob has no grant yet
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/v1/tables/people")
            .insert_header((USER_HEADER, "bob"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 403);

    // alice grants bob's group read access
    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/v1/tables/people/acl/group/field-team")
            .insert_header((USER_HEADER, "alice"))
            .set_json(json!({"role": "FILTERED_READER"}))
            .to_request(),
    )
    .await;
    assert!(resp.status().is_success());

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/v1/tables/people")
            .insert_header((USER_HEADER, "bob"))
            .insert_header((GROUPS_HEADER, "field-team"))
            .to_request(),
    )
    .await;
    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn test_diff_requires_data_etag_param() {
    let ctx = app_ctx();
    let app = service!(ctx);

    test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/v1/tables/people")
            .insert_header((USER_HEADER, "alice"))
            .set_json(people_definition())
            .to_request(),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/v1/tables/people/diff")
            .insert_header((USER_HEADER, "alice"))
            .to_request(),
    )
    .await;
    // missing dataEtag query parameter is a client error
    assert!(resp.status().is_client_error());
}

#[actix_web::test]
async fn test_file_upload_updates_manifest_and_etag() {
    let ctx = app_ctx();
    let app = service!(ctx);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/v1/manifest").to_request(),
    )
    .await;
    let empty: Value = test::read_body_json(resp).await;
    assert_eq!(empty["files"].as_array().unwrap().len(), 0);
    let empty_etag = empty["manifestEtag"].as_str().unwrap().to_string();

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/v1/files/assets/index.html")
            .insert_header((USER_HEADER, "alice"))
            .insert_header(("content-type", "text/html"))
            .set_payload("<html/>")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 201);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/v1/manifest").to_request(),
    )
    .await;
    let manifest: Value = test::read_body_json(resp).await;
    assert_eq!(manifest["files"].as_array().unwrap().len(), 1);
    assert_eq!(manifest["files"][0]["filename"], "assets/index.html");
    assert_ne!(manifest["manifestEtag"].as_str().unwrap(), empty_etag);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/v1/files/assets/index.html").to_request(),
    )
    .await;
    assert!(resp.status().is_success());
    let body = test::read_body(resp).await;
    assert_eq!(&body[..], b"<html/>");
}
