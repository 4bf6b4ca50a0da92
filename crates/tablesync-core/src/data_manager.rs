//! Row mutation and retrieval: the versioning core.
//!
//! Every mutation flows permission check -> ETag decision -> column
//! validation -> row CAS -> log append -> table data-ETag publication. The
//! row record is the unit of optimistic concurrency; losing its CAS means
//! rereading and redoing the whole decision, bounded by a retry budget.
//! Reads never block writers.

use crate::app_context::AppContext;
use crate::auth::TablesUserPermissions;
use crate::error::{Result, SyncError};
use crate::etag;
use std::collections::HashMap;
use std::sync::Arc;
use tablesync_commons::models::column::{CLIENT_ONLY_COLUMN_NAMES, SHARED_COLUMN_NAMES};
use tablesync_commons::{
    ColumnDefinition, Cursor, LogEntry, Row, RowId, SequenceValue, TableEntry, TableId,
    TablePermission,
};
use tablesync_store::EntityStore;
use tablesync_tables::{new_log_store, new_row_store, ColumnSetKey, LogStore, RowStore};

/// Same-row CAS retries before surfacing a transient conflict.
const MAX_ROW_CAS_RETRIES: usize = 5;

/// Table-entry CAS retries; the entry is the shared hot record, so writers
/// under contention deserve a few more attempts before giving up.
const MAX_ENTRY_CAS_RETRIES: usize = 10;

/// A page of rows plus the continuation cursor.
#[derive(Debug)]
pub struct WebsafeRows {
    pub rows: Vec<Row>,
    pub websafe_resume_cursor: Option<String>,
    pub has_more_results: bool,
}

struct TableContext {
    entry: TableEntry,
    columns: Vec<ColumnDefinition>,
    rows: RowStore,
    log: LogStore,
}

/// Row operations for one table on behalf of one caller.
pub struct DataManager {
    ctx: Arc<AppContext>,
    table_id: TableId,
    permissions: Arc<dyn TablesUserPermissions>,
}

impl DataManager {
    pub fn new(
        ctx: Arc<AppContext>,
        table_id: TableId,
        permissions: Arc<dyn TablesUserPermissions>,
    ) -> Self {
        Self { ctx, table_id, permissions }
    }

    fn table_context(&self) -> Result<TableContext> {
        let entry = self
            .ctx
            .table_entries()
            .get(&self.table_id)?
            .ok_or_else(|| SyncError::not_found(format!("table {}", self.table_id)))?;
        let Some(schema_etag) = entry.schema_etag.clone() else {
            log::error!("table {} has no promoted schema", self.table_id);
            return Err(SyncError::inconsistent_state(format!(
                "table {} has no promoted schema",
                self.table_id
            )));
        };
        let columns = self
            .ctx
            .column_defs()
            .get(&ColumnSetKey::new(self.table_id.clone(), schema_etag.clone()))?
            .ok_or_else(|| {
                log::error!(
                    "table {} is missing column definitions for schema {}",
                    self.table_id,
                    schema_etag
                );
                SyncError::inconsistent_state(format!(
                    "table {} is missing column definitions for schema {}",
                    self.table_id, schema_etag
                ))
            })?;
        Ok(TableContext {
            entry,
            columns,
            rows: new_row_store(self.ctx.backend().clone(), &self.table_id),
            log: new_log_store(self.ctx.backend().clone(), &self.table_id),
        })
    }

    /// Fetches a single live row.
    pub fn get_row(&self, row_id: &RowId) -> Result<Row> {
        self.permissions.check_permission(&self.table_id, TablePermission::Read)?;
        let tc = self.table_context()?;
        let row = tc
            .rows
            .get(row_id)?
            .filter(|r| !r.deleted)
            .ok_or_else(|| SyncError::not_found(format!("row {}", row_id)))?;

        let unfiltered =
            self.permissions.has_permission(&self.table_id, TablePermission::UnfilteredRead)?;
        if !unfiltered
            && !self.permissions.has_filter_scope(TablePermission::Read, &row.filter_scope)
        {
            return Err(SyncError::permission_denied(format!("row {}", row_id)));
        }
        Ok(row)
    }

    /// Inserts or updates a row: the core write path.
    ///
    /// The ETag decision table, given a stored row:
    /// - matching ETag, identical values: idempotent resubmission; return
    ///   the stored row untouched (no new version, no log entry)
    /// - matching ETag, different values: normal update
    /// - stale ETag, values identical to *current* state: benign duplicate
    ///   of a raced write; succeed without a new version
    /// - stale ETag, different values: `ETagMismatch`, client must refetch
    ///
    /// Absent rows insert; any caller-supplied ETag is ignored since there
    /// is no prior version to match.
    pub fn insert_or_update_row(&self, change: &Row) -> Result<Row> {
        self.permissions.check_permission(&self.table_id, TablePermission::Write)?;
        let unfiltered =
            self.permissions.has_permission(&self.table_id, TablePermission::UnfilteredWrite)?;

        for _ in 0..MAX_ROW_CAS_RETRIES {
            let tc = self.table_context()?;
            let current_raw = tc.rows.get_raw(&change.row_id)?;
            let current: Option<Row> = match &current_raw {
                Some(bytes) => Some(tc.rows.deserialize(bytes)?),
                None => None,
            };

            // row-level permission: the stored scope guards updates, the
            // submitted scope guards inserts
            let guarded_scope =
                current.as_ref().map(|r| &r.filter_scope).unwrap_or(&change.filter_scope);
            if !unfiltered
                && !self.permissions.has_filter_scope(TablePermission::Write, guarded_scope)
            {
                return Err(SyncError::permission_denied(format!("row {}", change.row_id)));
            }

            if let Some(stored) = &current {
                let etag_matches = change.row_etag == stored.row_etag;
                if change.same_values(stored) {
                    // idempotent resubmission, or a value-identical
                    // duplicate that raced a concurrent writer; either way
                    // the stored state already says what the client wants
                    return Ok(stored.clone());
                }
                if !etag_matches {
                    return Err(SyncError::ETagMismatch(format!(
                        "row {} expected {} got {}",
                        change.row_id,
                        stored.row_etag.as_deref().unwrap_or("-"),
                        change.row_etag.as_deref().unwrap_or("-")
                    )));
                }
            }

            validate_row_values(change, &tc.columns)?;

            let new_data_etag = etag::new_etag();
            let mut new_row = change.clone();
            new_row.row_etag = Some(etag::new_etag());
            new_row.data_etag_at_modification = Some(new_data_etag.clone());
            new_row.deleted = false;
            new_row.create_user = current
                .as_ref()
                .and_then(|r| r.create_user.clone())
                .or_else(|| Some(self.permissions.user_id().clone()));
            new_row.last_update_user = Some(self.permissions.user_id().clone());

            if !tc.rows.put_if_unchanged(&change.row_id, current_raw.as_deref(), &new_row)? {
                log::debug!("row {} lost CAS, retrying", change.row_id);
                continue;
            }

            let sequence_value = self.ctx.sequencer().next_value(&self.table_id)?;
            let previous = current.as_ref().and_then(|r| r.row_etag.clone());
            let entry = LogEntry::new(sequence_value, previous, new_row.clone());
            tc.log.put(&sequence_value, &entry)?;

            self.advance_data_etag(&new_data_etag)?;
            return Ok(new_row);
        }

        Err(SyncError::TransientConflict(format!("row {}", change.row_id)))
    }

    /// Marks a row deleted. The tombstone keeps the row's metadata and
    /// still bumps the table data ETag; only table deletion purges it.
    pub fn delete_row(&self, row_id: &RowId, row_etag: &str) -> Result<Row> {
        self.permissions.check_permission(&self.table_id, TablePermission::Delete)?;
        let unfiltered =
            self.permissions.has_permission(&self.table_id, TablePermission::UnfilteredDelete)?;

        for _ in 0..MAX_ROW_CAS_RETRIES {
            let tc = self.table_context()?;
            let current_raw = tc
                .rows
                .get_raw(row_id)?
                .ok_or_else(|| SyncError::not_found(format!("row {}", row_id)))?;
            let stored: Row = tc.rows.deserialize(&current_raw)?;
            if stored.deleted {
                return Err(SyncError::not_found(format!("row {}", row_id)));
            }

            if !unfiltered
                && !self.permissions.has_filter_scope(TablePermission::Delete, &stored.filter_scope)
            {
                return Err(SyncError::permission_denied(format!("row {}", row_id)));
            }

            if stored.row_etag.as_deref() != Some(row_etag) {
                return Err(SyncError::ETagMismatch(format!(
                    "row {} expected {} got {}",
                    row_id,
                    stored.row_etag.as_deref().unwrap_or("-"),
                    row_etag
                )));
            }

            let new_data_etag = etag::new_etag();
            let mut tombstone = stored.clone();
            tombstone.deleted = true;
            tombstone.row_etag = Some(etag::new_etag());
            tombstone.data_etag_at_modification = Some(new_data_etag.clone());
            tombstone.last_update_user = Some(self.permissions.user_id().clone());

            if !tc.rows.put_if_unchanged(row_id, Some(&current_raw), &tombstone)? {
                log::debug!("row {} lost CAS during delete, retrying", row_id);
                continue;
            }

            let sequence_value = self.ctx.sequencer().next_value(&self.table_id)?;
            let entry = LogEntry::new(sequence_value, stored.row_etag.clone(), tombstone.clone());
            tc.log.put(&sequence_value, &entry)?;

            self.advance_data_etag(&new_data_etag)?;
            return Ok(tombstone);
        }

        Err(SyncError::TransientConflict(format!("row {}", row_id)))
    }

    /// Publishes a fresh table data ETag.
    ///
    /// Every writer stamps its own token; concurrent writers race on this
    /// one record and the last swap wins, which is fine: each committed
    /// token was never seen before, and readers only test for change.
    fn advance_data_etag(&self, new_data_etag: &str) -> Result<()> {
        for _ in 0..MAX_ENTRY_CAS_RETRIES {
            let raw = self
                .ctx
                .table_entries()
                .get_raw(&self.table_id)?
                .ok_or_else(|| {
                    SyncError::inconsistent_state(format!(
                        "table {} entry vanished mid-write",
                        self.table_id
                    ))
                })?;
            let mut entry: TableEntry = self.ctx.table_entries().deserialize(&raw)?;
            entry.data_etag = new_data_etag.to_string();
            if self.ctx.table_entries().put_if_unchanged(&self.table_id, Some(&raw), &entry)? {
                return Ok(());
            }
        }
        Err(SyncError::TransientConflict(format!("table {} entry", self.table_id)))
    }

    /// Pages through live, access-filtered rows in row-id order.
    pub fn get_rows(&self, cursor: Option<&Cursor>, fetch_limit: usize) -> Result<WebsafeRows> {
        self.permissions.check_permission(&self.table_id, TablePermission::Read)?;
        let unfiltered =
            self.permissions.has_permission(&self.table_id, TablePermission::UnfilteredRead)?;
        let tc = self.table_context()?;

        let start_key = cursor.map(|c| c.resume_key().to_vec());
        let page = tc.rows.scan_page(None, start_key.as_deref(), None)?;

        let mut rows = Vec::new();
        let mut last_key: Option<Vec<u8>> = None;
        let mut has_more = false;
        for (key, row) in page {
            if row.deleted {
                continue;
            }
            if !unfiltered
                && !self.permissions.has_filter_scope(TablePermission::Read, &row.filter_scope)
            {
                continue;
            }
            if rows.len() >= fetch_limit {
                has_more = true;
                break;
            }
            last_key = Some(key);
            rows.push(row);
        }

        let websafe_resume_cursor = if has_more {
            last_key.as_deref().map(|k| Cursor::after(k).to_websafe_string())
        } else {
            None
        };
        Ok(WebsafeRows { rows, websafe_resume_cursor, has_more_results: has_more })
    }

    /// Pages through row states changed since `base_data_etag`, one entry
    /// per row id (the latest), in sequence order.
    ///
    /// Ordering and completeness come from the sequencer's total order over
    /// the log, never from timestamps: concurrent writes with colliding
    /// wall clocks still have distinct sequence values.
    pub fn get_rows_since(
        &self,
        base_data_etag: &str,
        cursor: Option<&Cursor>,
        fetch_limit: usize,
        include_deleted: bool,
    ) -> Result<WebsafeRows> {
        self.permissions.check_permission(&self.table_id, TablePermission::Read)?;
        let unfiltered =
            self.permissions.has_permission(&self.table_id, TablePermission::UnfilteredRead)?;
        let tc = self.table_context()?;

        let start_key = match cursor {
            Some(c) => c.resume_key().to_vec(),
            None => {
                let boundary = self.resolve_sequence_boundary(&tc, base_data_etag)?;
                boundary.next().to_bytes().to_vec()
            }
        };

        // fetch_limit bounds log entries consumed per page, which keeps
        // pagination making progress even when deduplication collapses
        // many entries into one row
        let mut page = tc.log.scan_page(None, Some(&start_key), Some(fetch_limit + 1))?;
        let has_more = page.len() > fetch_limit;
        if has_more {
            page.truncate(fetch_limit);
        }
        let last_key = page.last().map(|(k, _)| k.clone());

        let mut latest: HashMap<RowId, (SequenceValue, Row)> = HashMap::new();
        for (_, entry) in page {
            latest.insert(entry.row.row_id.clone(), (entry.sequence_value, entry.row));
        }

        let mut ordered: Vec<(SequenceValue, Row)> = latest.into_values().collect();
        ordered.sort_by_key(|(seq, _)| *seq);

        let mut rows = Vec::new();
        for (_, row) in ordered {
            if row.deleted && !include_deleted {
                continue;
            }
            if !unfiltered
                && !self.permissions.has_filter_scope(TablePermission::Read, &row.filter_scope)
            {
                continue;
            }
            rows.push(row);
        }

        let websafe_resume_cursor = if has_more {
            last_key.as_deref().map(|k| Cursor::after(k).to_websafe_string())
        } else {
            None
        };
        Ok(WebsafeRows { rows, websafe_resume_cursor, has_more_results: has_more })
    }

    /// Maps a data ETag to the highest log sequence recorded under it.
    ///
    /// The creation-time ETag has no log entries; it resolves to the
    /// entry's apriori sequence value, as does an ETag that predates the
    /// table's retained history; returning everything is the safe answer
    /// for a client that far behind.
    fn resolve_sequence_boundary(
        &self,
        tc: &TableContext,
        base_data_etag: &str,
    ) -> Result<SequenceValue> {
        let mut boundary = None;
        for (_, entry) in tc.log.scan_page(None, None, None)? {
            if entry.row.data_etag_at_modification.as_deref() == Some(base_data_etag) {
                boundary = Some(entry.sequence_value);
            }
        }
        Ok(boundary.unwrap_or(tc.entry.apriori_data_sequence_value))
    }
}

/// Column validation; rejects before any mutation is attempted.
fn validate_row_values(row: &Row, columns: &[ColumnDefinition]) -> Result<()> {
    for name in row.values.keys() {
        if CLIENT_ONLY_COLUMN_NAMES.contains(name.as_str()) {
            return Err(SyncError::BadColumnName(format!(
                "client-only column {} should never be transmitted to the server",
                name
            )));
        }
        if SHARED_COLUMN_NAMES.contains(name.as_str()) {
            return Err(SyncError::BadColumnName(format!(
                "shared column {} should be passed using its dedicated field",
                name
            )));
        }
        let known = columns
            .iter()
            .any(|c| c.element_key == *name && c.unit_of_retention);
        if !known {
            log::error!("bad column name: {}", name);
            return Err(SyncError::BadColumnName(name.clone()));
        }
    }
    Ok(())
}
