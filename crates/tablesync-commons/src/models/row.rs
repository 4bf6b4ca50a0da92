//! The row model: current state of one record of a user table.

use super::filter_scope::FilterScope;
use crate::ids::{RowId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Client savepoint kind recorded with each row version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SavepointType {
    Complete,
    Incomplete,
}

/// One row of a user table.
///
/// The same shape serves as the wire representation of a change request and
/// as the persisted current state. On a change request `row_etag` carries
/// the version the client last saw (`None` on first insert); on a stored or
/// returned row it is always present and names the current version.
///
/// `values` holds only user-defined columns, keyed by element key. Shared
/// metadata (form id, locale, savepoint fields, filter scope) travels in its
/// dedicated fields and is rejected if smuggled through `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub row_id: RowId,
    #[serde(default)]
    pub row_etag: Option<String>,
    /// The table's data ETag published by the write that produced this
    /// version. Binds the row version to the table version.
    #[serde(default)]
    pub data_etag_at_modification: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub create_user: Option<UserId>,
    #[serde(default)]
    pub last_update_user: Option<UserId>,
    #[serde(default)]
    pub filter_scope: FilterScope,
    #[serde(default)]
    pub form_id: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    pub savepoint_type: SavepointType,
    pub savepoint_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub savepoint_creator: Option<String>,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl Row {
    /// Builds a change request for a first insert (no prior version token).
    #[allow(clippy::too_many_arguments)]
    pub fn for_insert(
        row_id: RowId,
        form_id: Option<String>,
        locale: Option<String>,
        savepoint_type: SavepointType,
        savepoint_timestamp: DateTime<Utc>,
        savepoint_creator: Option<String>,
        filter_scope: FilterScope,
        values: BTreeMap<String, String>,
    ) -> Self {
        Self {
            row_id,
            row_etag: None,
            data_etag_at_modification: None,
            deleted: false,
            create_user: None,
            last_update_user: None,
            filter_scope,
            form_id,
            locale,
            savepoint_type,
            savepoint_timestamp,
            savepoint_creator,
            values,
        }
    }

    /// Builds a change request updating an existing version.
    #[allow(clippy::too_many_arguments)]
    pub fn for_update(
        row_id: RowId,
        row_etag: String,
        form_id: Option<String>,
        locale: Option<String>,
        savepoint_type: SavepointType,
        savepoint_timestamp: DateTime<Utc>,
        savepoint_creator: Option<String>,
        filter_scope: FilterScope,
        values: BTreeMap<String, String>,
    ) -> Self {
        Self {
            row_etag: Some(row_etag),
            ..Self::for_insert(
                row_id,
                form_id,
                locale,
                savepoint_type,
                savepoint_timestamp,
                savepoint_creator,
                filter_scope,
                values,
            )
        }
    }

    /// Whether the submitted user-column values match another row's exactly.
    ///
    /// Used to classify resubmissions and stale-but-identical duplicates.
    /// Comparison is exhaustive over every user column; metadata fields are
    /// deliberately excluded (a client replaying a request may carry a newer
    /// savepoint timestamp).
    pub fn same_values(&self, other: &Row) -> bool {
        self.values == other.values && self.deleted == other.deleted
    }
}
