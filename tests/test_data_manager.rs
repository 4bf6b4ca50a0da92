//! Integration tests for the row write path and "changes since" queries.
//!
//! Covers the protocol's contract surface:
//! - idempotent resubmission (same ETag, same values → same version)
//! - stale-but-harmless duplicates (stale ETag, identical values)
//! - conflict detection (stale ETag, different values)
//! - table data-ETag movement on every committed mutation
//! - atomic bad-column rejection
//! - sequence-ordered diffs deduplicated to the latest state per row
//! - access filtering of hidden rows on read

use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tablesync_commons::{
    Access, ColumnDefinition, FilterScope, Row, RowId, SavepointType, Scope, TableId, TableRole,
    UserId,
};
use tablesync_core::{
    AclManager, AclUserPermissions, AllowAllPermissions, AppContext, DataManager, SyncError,
    TableManager, TablesUserPermissions,
};
use tablesync_store::{EntityStore, InMemoryBackend};
use tablesync_tables::new_log_store;

fn setup() -> (Arc<AppContext>, TableManager, DataManager, TableId) {
    let ctx = Arc::new(AppContext::new(Arc::new(InMemoryBackend::new())));
    let permissions: Arc<dyn TablesUserPermissions> = Arc::new(AllowAllPermissions::new("myid"));
    let table_id = TableId::new("people");
    let tm = TableManager::new(ctx.clone(), permissions.clone());
    tm.create_table(
        &table_id,
        vec![
            ColumnDefinition::new("name", "string"),
            ColumnDefinition::new("age", "integer"),
            ColumnDefinition::new("weight", "integer"),
        ],
    )
    .unwrap();
    let dm = DataManager::new(ctx.clone(), table_id.clone(), permissions);
    (ctx, tm, dm, table_id)
}

fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn insert_row(id: &str, vals: &[(&str, &str)]) -> Row {
    Row::for_insert(
        RowId::new(id),
        Some("form1".to_string()),
        Some("en_US".to_string()),
        SavepointType::Complete,
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        Some("creator1".to_string()),
        FilterScope::empty(),
        values(vals),
    )
}

fn log_entry_count(ctx: &Arc<AppContext>, table_id: &TableId) -> usize {
    new_log_store(ctx.backend().clone(), table_id)
        .scan_page(None, None, None)
        .unwrap()
        .len()
}

fn data_etag(tm: &TableManager, table_id: &TableId) -> String {
    tm.get_table(table_id).unwrap().data_etag
}

#[test]
fn test_get_rows_empty() {
    let (_ctx, _tm, dm, _table_id) = setup();
    let result = dm.get_rows(None, 2000).unwrap();
    assert!(result.rows.is_empty());
    assert!(!result.has_more_results);
}

#[test]
fn test_insert_rows_assigns_etags() {
    let (ctx, _tm, dm, table_id) = setup();
    let dylan = dm.insert_or_update_row(&insert_row("1", &[("name", "dylan"), ("age", "23")])).unwrap();
    let john = dm.insert_or_update_row(&insert_row("2", &[("name", "john"), ("age", "58")])).unwrap();

    assert!(dylan.row_etag.is_some());
    assert!(john.row_etag.is_some());
    assert_ne!(dylan.row_etag, john.row_etag);
    assert_eq!(dylan.values["name"], "dylan");
    assert_eq!(log_entry_count(&ctx, &table_id), 2);
}

#[test]
fn test_idempotent_resubmission_returns_same_version() {
    let (ctx, _tm, dm, table_id) = setup();
    let first = dm.insert_or_update_row(&insert_row("1", &[("name", "dylan"), ("age", "23")])).unwrap();

    // the client never saw the response and resends the committed row verbatim
    let second = dm.insert_or_update_row(&first).unwrap();
    assert_eq!(first.row_etag, second.row_etag);
    assert_eq!(log_entry_count(&ctx, &table_id), 1);
}

#[test]
fn test_stale_etag_identical_values_is_benign() {
    let (ctx, tm, dm, table_id) = setup();
    let committed = dm.insert_or_update_row(&insert_row("1", &[("name", "dylan"), ("age", "23")])).unwrap();
    let etag_before = data_etag(&tm, &table_id);

    let mut resend = committed.clone();
    resend.row_etag = Some("no-such-version".to_string());
    let result = dm.insert_or_update_row(&resend).unwrap();

    assert_eq!(result.row_etag, committed.row_etag);
    assert_eq!(log_entry_count(&ctx, &table_id), 1);
    assert_eq!(data_etag(&tm, &table_id), etag_before);
}

#[test]
fn test_stale_etag_different_values_conflicts() {
    let (ctx, _tm, dm, table_id) = setup();
    let committed = dm.insert_or_update_row(&insert_row("1", &[("name", "dylan"), ("age", "23")])).unwrap();

    let mut conflicting = committed.clone();
    conflicting.row_etag = Some("no-such-version".to_string());
    conflicting.values.insert("age".to_string(), "40".to_string());

    let err = dm.insert_or_update_row(&conflicting).unwrap_err();
    assert!(matches!(err, SyncError::ETagMismatch(_)));

    // stored row unchanged
    let stored = dm.get_row(&RowId::new("1")).unwrap();
    assert_eq!(stored.values["age"], "23");
    assert_eq!(stored.row_etag, committed.row_etag);
    assert_eq!(log_entry_count(&ctx, &table_id), 1);
}

#[test]
fn test_update_with_current_etag_creates_new_version() {
    let (ctx, _tm, dm, table_id) = setup();
    let first = dm.insert_or_update_row(&insert_row("1", &[("name", "dylan"), ("age", "23")])).unwrap();

    let mut update = first.clone();
    update.values.insert("age".to_string(), "24".to_string());
    let second = dm.insert_or_update_row(&update).unwrap();

    assert_ne!(first.row_etag, second.row_etag);
    assert_eq!(second.values["age"], "24");
    assert_eq!(log_entry_count(&ctx, &table_id), 2);

    // version chain is intact in the log
    let log = new_log_store(ctx.backend().clone(), &table_id);
    let entries = log.scan_page(None, None, None).unwrap();
    assert_eq!(entries[0].1.previous_row_etag, None);
    assert_eq!(entries[1].1.previous_row_etag, first.row_etag);
}

#[test]
fn test_data_etag_advances_per_mutation_and_is_stable_between() {
    let (_ctx, tm, dm, table_id) = setup();
    let initial = data_etag(&tm, &table_id);

    let row = dm.insert_or_update_row(&insert_row("1", &[("name", "dylan")])).unwrap();
    let after_insert = data_etag(&tm, &table_id);
    assert_ne!(initial, after_insert);
    assert_eq!(row.data_etag_at_modification.as_deref(), Some(after_insert.as_str()));

    // no mutation, same token
    assert_eq!(data_etag(&tm, &table_id), after_insert);

    let mut update = row.clone();
    update.values.insert("name".to_string(), "dylan2".to_string());
    dm.insert_or_update_row(&update).unwrap();
    let after_update = data_etag(&tm, &table_id);
    assert_ne!(after_insert, after_update);
    assert_ne!(initial, after_update);

    let stored = dm.get_row(&RowId::new("1")).unwrap();
    dm.delete_row(&RowId::new("1"), stored.row_etag.as_deref().unwrap()).unwrap();
    assert_ne!(after_update, data_etag(&tm, &table_id));
}

#[test]
fn test_bad_column_rejection_is_atomic() {
    let (ctx, tm, dm, table_id) = setup();
    let etag_before = data_etag(&tm, &table_id);

    let err = dm
        .insert_or_update_row(&insert_row("1", &[("name", "dylan"), ("namediff", "x")]))
        .unwrap_err();
    assert!(matches!(err, SyncError::BadColumnName(_)));

    // no partial write: row absent, no log entry, data etag untouched
    assert!(matches!(dm.get_row(&RowId::new("1")).unwrap_err(), SyncError::NotFound(_)));
    assert_eq!(log_entry_count(&ctx, &table_id), 0);
    assert_eq!(data_etag(&tm, &table_id), etag_before);
}

#[test]
fn test_bad_column_rejection_leaves_update_unchanged() {
    let (_ctx, _tm, dm, _table_id) = setup();
    let committed = dm.insert_or_update_row(&insert_row("1", &[("name", "dylan"), ("age", "23")])).unwrap();

    let mut update = committed.clone();
    update.values.insert("_sync_state".to_string(), "synced".to_string());
    update.values.insert("age".to_string(), "99".to_string());
    let err = dm.insert_or_update_row(&update).unwrap_err();
    assert!(matches!(err, SyncError::BadColumnName(_)));

    let stored = dm.get_row(&RowId::new("1")).unwrap();
    assert_eq!(stored.values["age"], "23");
    assert_eq!(stored.row_etag, committed.row_etag);
}

#[test]
fn test_delete_row_leaves_tombstone_and_bumps_etag() {
    let (ctx, tm, dm, table_id) = setup();
    let committed = dm.insert_or_update_row(&insert_row("1", &[("name", "dylan")])).unwrap();
    let etag_before = data_etag(&tm, &table_id);

    let tombstone = dm
        .delete_row(&RowId::new("1"), committed.row_etag.as_deref().unwrap())
        .unwrap();
    assert!(tombstone.deleted);
    assert_ne!(tombstone.row_etag, committed.row_etag);
    assert_ne!(data_etag(&tm, &table_id), etag_before);

    assert!(dm.get_rows(None, 2000).unwrap().rows.is_empty());
    assert!(matches!(dm.get_row(&RowId::new("1")).unwrap_err(), SyncError::NotFound(_)));
    assert_eq!(log_entry_count(&ctx, &table_id), 2);

    // deleting what is already gone is not found
    let err = dm
        .delete_row(&RowId::new("1"), tombstone.row_etag.as_deref().unwrap())
        .unwrap_err();
    assert!(matches!(err, SyncError::NotFound(_)));
}

#[test]
fn test_delete_requires_current_etag() {
    let (_ctx, _tm, dm, _table_id) = setup();
    dm.insert_or_update_row(&insert_row("1", &[("name", "dylan")])).unwrap();

    let err = dm.delete_row(&RowId::new("1"), "stale").unwrap_err();
    assert!(matches!(err, SyncError::ETagMismatch(_)));
    assert_eq!(dm.get_rows(None, 2000).unwrap().rows.len(), 1);
}

#[test]
fn test_get_rows_since_returns_latest_state_per_row() {
    let (_ctx, tm, dm, table_id) = setup();
    let begin_etag = data_etag(&tm, &table_id);

    let r1 = dm.insert_or_update_row(&insert_row("1", &[("name", "dylan"), ("age", "23")])).unwrap();
    dm.insert_or_update_row(&insert_row("2", &[("name", "john"), ("age", "58")])).unwrap();

    // update row 1's age twice
    let mut update = r1.clone();
    update.values.insert("age".to_string(), "24".to_string());
    let r1b = dm.insert_or_update_row(&update).unwrap();
    let mut update = r1b.clone();
    update.values.insert("age".to_string(), "25".to_string());
    dm.insert_or_update_row(&update).unwrap();

    let diff = dm.get_rows_since(&begin_etag, None, 2000, false).unwrap();
    assert_eq!(diff.rows.len(), 2, "one entry per changed row, not per version");
    let row1 = diff.rows.iter().find(|r| r.row_id.as_str() == "1").unwrap();
    assert_eq!(row1.values["age"], "25", "latest state, not an intermediate");
    assert!(!diff.has_more_results);
}

#[test]
fn test_get_rows_since_from_intermediate_etag() {
    let (_ctx, tm, dm, table_id) = setup();
    dm.insert_or_update_row(&insert_row("1", &[("name", "dylan")])).unwrap();
    let midpoint = data_etag(&tm, &table_id);

    dm.insert_or_update_row(&insert_row("2", &[("name", "john")])).unwrap();

    let diff = dm.get_rows_since(&midpoint, None, 2000, false).unwrap();
    assert_eq!(diff.rows.len(), 1);
    assert_eq!(diff.rows[0].row_id.as_str(), "2");
}

#[test]
fn test_get_rows_since_orders_by_sequence_despite_equal_timestamps() {
    let (_ctx, tm, dm, table_id) = setup();
    let begin_etag = data_etag(&tm, &table_id);

    // identical savepoint timestamps; the sequencer must order them anyway
    dm.insert_or_update_row(&insert_row("b", &[("name", "second")])).unwrap();
    dm.insert_or_update_row(&insert_row("a", &[("name", "first")])).unwrap();

    let diff = dm.get_rows_since(&begin_etag, None, 2000, false).unwrap();
    let ids: Vec<&str> = diff.rows.iter().map(|r| r.row_id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"], "write order, not row-id or timestamp order");
}

#[test]
fn test_get_rows_since_reports_deletes_when_asked() {
    let (_ctx, tm, dm, table_id) = setup();
    let begin_etag = data_etag(&tm, &table_id);

    let committed = dm.insert_or_update_row(&insert_row("1", &[("name", "dylan")])).unwrap();
    dm.delete_row(&RowId::new("1"), committed.row_etag.as_deref().unwrap()).unwrap();

    let without = dm.get_rows_since(&begin_etag, None, 2000, false).unwrap();
    assert!(without.rows.is_empty());

    let with = dm.get_rows_since(&begin_etag, None, 2000, true).unwrap();
    assert_eq!(with.rows.len(), 1);
    assert!(with.rows[0].deleted);
}

#[test]
fn test_get_rows_pages_with_cursor() {
    let (_ctx, _tm, dm, _table_id) = setup();
    for i in 1..=5 {
        dm.insert_or_update_row(&insert_row(&format!("{:02}", i), &[("name", "x")])).unwrap();
    }

    let mut seen = Vec::new();
    let mut cursor = None;
    loop {
        let page = dm.get_rows(cursor.as_ref(), 2).unwrap();
        assert!(page.rows.len() <= 2);
        seen.extend(page.rows.iter().map(|r| r.row_id.as_str().to_string()));
        if !page.has_more_results {
            break;
        }
        let websafe = page.websafe_resume_cursor.expect("cursor present when more results");
        cursor = Some(tablesync_commons::Cursor::from_websafe_string(&websafe).unwrap());
    }
    assert_eq!(seen, vec!["01", "02", "03", "04", "05"]);
}

#[test]
fn test_hidden_rows_invisible_to_filtered_reader() {
    let ctx = Arc::new(AppContext::new(Arc::new(InMemoryBackend::new())));
    let alice: Arc<dyn TablesUserPermissions> =
        Arc::new(AclUserPermissions::new(UserId::new("alice"), &[], ctx.acls().clone()));
    let table_id = TableId::new("people");
    let tm = TableManager::new(ctx.clone(), alice.clone());
    tm.create_table(&table_id, vec![ColumnDefinition::new("name", "string")]).unwrap();

    // alice (Administer from creating) writes one open row and one hidden
    // row owned by carol
    let dm_alice = DataManager::new(ctx.clone(), table_id.clone(), alice.clone());
    dm_alice.insert_or_update_row(&insert_row("open", &[("name", "visible")])).unwrap();
    let mut hidden = insert_row("secret", &[("name", "classified")]);
    hidden.filter_scope = FilterScope::with_owner(Access::Hidden, "carol");
    dm_alice.insert_or_update_row(&hidden).unwrap();

    AclManager::new(ctx.clone(), alice.clone())
        .set_acl(&table_id, Scope::user("bob"), TableRole::FilteredReader)
        .unwrap();

    let bob: Arc<dyn TablesUserPermissions> =
        Arc::new(AclUserPermissions::new(UserId::new("bob"), &[], ctx.acls().clone()));
    let dm_bob = DataManager::new(ctx.clone(), table_id.clone(), bob);
    let rows = dm_bob.get_rows(None, 2000).unwrap();
    let ids: Vec<&str> = rows.rows.iter().map(|r| r.row_id.as_str()).collect();
    assert_eq!(ids, vec!["open"], "hidden row exists in storage but is filtered");

    // carol, the row owner, sees it
    let carol: Arc<dyn TablesUserPermissions> =
        Arc::new(AclUserPermissions::new(UserId::new("carol"), &[], ctx.acls().clone()));
    AclManager::new(ctx.clone(), alice)
        .set_acl(&table_id, Scope::user("carol"), TableRole::FilteredReader)
        .unwrap();
    let dm_carol = DataManager::new(ctx, table_id, carol);
    assert_eq!(dm_carol.get_rows(None, 2000).unwrap().rows.len(), 2);
}

#[test]
fn test_filtered_writer_cannot_touch_foreign_readonly_row() {
    let ctx = Arc::new(AppContext::new(Arc::new(InMemoryBackend::new())));
    let alice: Arc<dyn TablesUserPermissions> =
        Arc::new(AclUserPermissions::new(UserId::new("alice"), &[], ctx.acls().clone()));
    let table_id = TableId::new("people");
    TableManager::new(ctx.clone(), alice.clone())
        .create_table(&table_id, vec![ColumnDefinition::new("name", "string")])
        .unwrap();

    let dm_alice = DataManager::new(ctx.clone(), table_id.clone(), alice.clone());
    let mut guarded = insert_row("1", &[("name", "original")]);
    guarded.filter_scope = FilterScope::with_owner(Access::ReadOnly, "alice");
    let committed = dm_alice.insert_or_update_row(&guarded).unwrap();

    AclManager::new(ctx.clone(), alice)
        .set_acl(&table_id, Scope::user("bob"), TableRole::FilteredWriter)
        .unwrap();
    let bob: Arc<dyn TablesUserPermissions> =
        Arc::new(AclUserPermissions::new(UserId::new("bob"), &[], ctx.acls().clone()));
    let dm_bob = DataManager::new(ctx, table_id, bob);

    // bob can read it
    assert_eq!(dm_bob.get_rows(None, 2000).unwrap().rows.len(), 1);

    // but not overwrite it
    let mut attempt = committed.clone();
    attempt.values.insert("name".to_string(), "hijacked".to_string());
    let err = dm_bob.insert_or_update_row(&attempt).unwrap_err();
    assert!(matches!(err, SyncError::PermissionDenied(_)));
}

#[test]
fn test_operations_on_missing_table_fail_not_found() {
    let ctx = Arc::new(AppContext::new(Arc::new(InMemoryBackend::new())));
    let permissions: Arc<dyn TablesUserPermissions> = Arc::new(AllowAllPermissions::new("myid"));
    let dm = DataManager::new(ctx, TableId::new("absent"), permissions);

    assert!(matches!(
        dm.insert_or_update_row(&insert_row("1", &[("name", "x")])).unwrap_err(),
        SyncError::NotFound(_)
    ));
    assert!(matches!(dm.get_rows(None, 10).unwrap_err(), SyncError::NotFound(_)));
}
