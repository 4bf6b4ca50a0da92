//! Table lifecycle: creation, deletion, lookup, listing.

use crate::app_context::AppContext;
use crate::auth::TablesUserPermissions;
use crate::error::{Result, SyncError};
use crate::etag;
use chrono::Utc;
use std::sync::Arc;
use tablesync_commons::constants::Partitions;
use tablesync_commons::models::{
    ColumnDefinition, Cursor, Scope, TableAcl, TableEntry, TablePermission, TableRole,
};
use tablesync_commons::models::column::{CLIENT_ONLY_COLUMN_NAMES, SHARED_COLUMN_NAMES};
use tablesync_commons::TableId;
use tablesync_store::{EntityStore, LockPurpose, Operation, Partition};
use tablesync_tables::{new_log_store, new_row_store, AclKey, ColumnDefsStore, ColumnSetKey, ManifestKey};

/// A page of table entries plus the continuation cursor.
#[derive(Debug)]
pub struct WebsafeTables {
    pub tables: Vec<TableEntry>,
    pub websafe_resume_cursor: Option<String>,
    pub has_more_results: bool,
}

/// Owns the table-level state machine:
/// `{absent} -> CREATING -> ACTIVE -> {absent}`. A table is CREATING while
/// its entry carries only a pending schema ETag; promotion to ACTIVE
/// happens after the column set is persisted. Creation and deletion run
/// under the table-structure advisory lock.
pub struct TableManager {
    ctx: Arc<AppContext>,
    permissions: Arc<dyn TablesUserPermissions>,
}

impl TableManager {
    pub fn new(ctx: Arc<AppContext>, permissions: Arc<dyn TablesUserPermissions>) -> Self {
        Self { ctx, permissions }
    }

    /// Creates a table with the given column definitions.
    ///
    /// Re-creating a table with an identical column set returns the
    /// existing entry (client retry safety); a different column set fails
    /// with `TableAlreadyExists`; schema changes go through an explicit
    /// migration, never through create.
    pub fn create_table(
        &self,
        table_id: &TableId,
        columns: Vec<ColumnDefinition>,
    ) -> Result<TableEntry> {
        validate_table_id(table_id)?;
        validate_column_definitions(&columns)?;

        let lease = self
            .ctx
            .locks()
            .acquire(table_id.as_str(), LockPurpose::TableStructure)?;
        let result = self.create_table_locked(table_id, columns);
        self.ctx.locks().release(lease)?;
        result
    }

    fn create_table_locked(
        &self,
        table_id: &TableId,
        columns: Vec<ColumnDefinition>,
    ) -> Result<TableEntry> {
        if let Some(existing) = self.ctx.table_entries().get(table_id)? {
            return if self.same_schema(&existing, &columns)? {
                Ok(existing)
            } else {
                Err(SyncError::TableAlreadyExists(table_id.to_string()))
            };
        }

        let schema_etag = etag::new_etag();
        let entry = TableEntry {
            table_id: table_id.clone(),
            schema_etag: None,
            pending_schema_etag: Some(schema_etag.clone()),
            data_etag: etag::new_etag(),
            apriori_data_sequence_value: self.ctx.sequencer().next_value(table_id)?,
            created_at: Utc::now(),
        };

        // create-only CAS; a raced creator surfaces as already-exists
        if !self.ctx.table_entries().put_if_unchanged(table_id, None, &entry)? {
            return Err(SyncError::TableAlreadyExists(table_id.to_string()));
        }

        self.ctx
            .column_defs()
            .put(&ColumnSetKey::new(table_id.clone(), schema_etag.clone()), &columns)?;

        new_row_store(self.ctx.backend().clone(), table_id);
        new_log_store(self.ctx.backend().clone(), table_id);

        // promote: CREATING -> ACTIVE
        let mut active = entry;
        active.schema_etag = Some(schema_etag);
        active.pending_schema_etag = None;
        self.ctx.table_entries().put(table_id, &active)?;

        let creator_acl = TableAcl {
            scope: Scope::user(self.permissions.user_id().as_str()),
            role: TableRole::Administer,
        };
        self.ctx
            .acls()
            .put(&AclKey::new(table_id.clone(), creator_acl.scope.clone()), &creator_acl)?;

        log::info!(
            "created table {} (schema {})",
            table_id,
            active.schema_etag.as_deref().unwrap_or("-")
        );
        Ok(active)
    }

    fn same_schema(&self, existing: &TableEntry, columns: &[ColumnDefinition]) -> Result<bool> {
        let Some(schema_etag) = &existing.schema_etag else {
            // stuck in CREATING; never silently adopt it
            return Err(SyncError::inconsistent_state(format!(
                "table {} has no promoted schema",
                existing.table_id
            )));
        };
        let stored = self
            .ctx
            .column_defs()
            .get(&ColumnSetKey::new(existing.table_id.clone(), schema_etag.clone()))?
            .ok_or_else(|| {
                SyncError::inconsistent_state(format!(
                    "table {} is missing column definitions for schema {}",
                    existing.table_id, schema_etag
                ))
            })?;

        let mut stored_sorted = stored;
        stored_sorted.sort_by(|a, b| a.element_key.cmp(&b.element_key));
        let mut submitted_sorted = columns.to_vec();
        submitted_sorted.sort_by(|a, b| a.element_key.cmp(&b.element_key));
        Ok(stored_sorted == submitted_sorted)
    }

    /// Fetches a table entry; requires read permission on the table.
    pub fn get_table(&self, table_id: &TableId) -> Result<TableEntry> {
        self.permissions.check_permission(table_id, TablePermission::Read)?;
        self.ctx
            .table_entries()
            .get(table_id)?
            .ok_or_else(|| SyncError::not_found(format!("table {}", table_id)))
    }

    /// Deletes a table with everything it owns: entry, column sets, row and
    /// log partitions, ACL entries, file records, and the cached manifest
    /// ETag.
    pub fn delete_table(&self, table_id: &TableId) -> Result<()> {
        self.permissions.check_permission(table_id, TablePermission::Administer)?;

        let lease = self
            .ctx
            .locks()
            .acquire(table_id.as_str(), LockPurpose::TableStructure)?;
        let result = self.delete_table_locked(table_id);
        self.ctx.locks().release(lease)?;
        result
    }

    fn delete_table_locked(&self, table_id: &TableId) -> Result<()> {
        if self.ctx.table_entries().get(table_id)?.is_none() {
            return Err(SyncError::not_found(format!("table {}", table_id)));
        }

        let mut operations: Vec<Operation> = vec![
            self.ctx.table_entries().delete_op(table_id),
            self.ctx.manifest_etags().delete_op(&ManifestKey::Table(table_id.clone())),
        ];

        let column_prefix = ColumnDefsStore::table_prefix(table_id);
        for (key, _) in self.ctx.column_defs().scan_page(Some(&column_prefix), None, None)? {
            operations.push(Operation::Delete {
                partition: Partition::new(Partitions::COLUMN_DEFINITIONS),
                key,
            });
        }

        let acl_prefix = tablesync_tables::AclStore::table_prefix(table_id);
        for (key, _) in self.ctx.acls().scan_page(Some(&acl_prefix), None, None)? {
            operations.push(Operation::Delete {
                partition: Partition::new(Partitions::TABLE_ACLS),
                key,
            });
        }

        let file_prefix = tablesync_tables::FileInfoStore::scope_prefix(Some(table_id));
        for (key, _) in self.ctx.file_info().scan_page(Some(&file_prefix), None, None)? {
            operations.push(Operation::Delete {
                partition: Partition::new(Partitions::FILE_INFO),
                key: key.clone(),
            });
            operations.push(Operation::Delete {
                partition: Partition::new(Partitions::FILE_BLOBS),
                key,
            });
        }

        self.ctx.backend().batch(operations)?;
        self.ctx.backend().drop_partition(&Partition::new(Partitions::rows(table_id)))?;
        self.ctx.backend().drop_partition(&Partition::new(Partitions::log(table_id)))?;

        log::info!("deleted table {}", table_id);
        Ok(())
    }

    /// Lists tables the caller may read, in table-id order, paginated.
    pub fn list_tables(&self, cursor: Option<&Cursor>, fetch_limit: usize) -> Result<WebsafeTables> {
        let start_key = cursor.map(|c| c.resume_key().to_vec());
        let page = self
            .ctx
            .table_entries()
            .scan_page(None, start_key.as_deref(), None)?;

        let mut tables = Vec::new();
        let mut last_key: Option<Vec<u8>> = None;
        let mut has_more = false;
        for (key, entry) in page {
            if !self.permissions.has_permission(&entry.table_id, TablePermission::Read)? {
                continue;
            }
            if tables.len() >= fetch_limit {
                has_more = true;
                break;
            }
            last_key = Some(key);
            tables.push(entry);
        }

        let websafe_resume_cursor = if has_more {
            last_key.as_deref().map(|k| Cursor::after(k).to_websafe_string())
        } else {
            None
        };
        Ok(WebsafeTables { tables, websafe_resume_cursor, has_more_results: has_more })
    }
}

/// Table ids become partition names and key components, so they are
/// restricted to a conservative character set.
fn validate_table_id(table_id: &TableId) -> Result<()> {
    let id = table_id.as_str();
    let valid = !id.is_empty()
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(SyncError::InvalidInput(format!("invalid table id {:?}", id)))
    }
}

/// Rejects reserved or duplicate column names before anything is written.
fn validate_column_definitions(columns: &[ColumnDefinition]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for column in columns {
        let key = column.element_key.as_str();
        if key.is_empty() {
            return Err(SyncError::BadColumnName("empty element key".to_string()));
        }
        if CLIENT_ONLY_COLUMN_NAMES.contains(key) || SHARED_COLUMN_NAMES.contains(key) {
            return Err(SyncError::BadColumnName(format!(
                "column name {} is reserved",
                key
            )));
        }
        if !seen.insert(key) {
            return Err(SyncError::BadColumnName(format!("duplicate column {}", key)));
        }
    }
    Ok(())
}
