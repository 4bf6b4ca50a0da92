//! Column definitions and the reserved column-name sets.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Definition of one user column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    /// Storage key of the column; the name rows use in their value maps.
    pub element_key: String,
    #[serde(default)]
    pub element_name: Option<String>,
    #[serde(default)]
    pub element_type: Option<String>,
    /// JSON-encoded list of child element keys for composite types.
    #[serde(default)]
    pub list_child_element_keys: Option<String>,
    /// Whether this column holds data directly (composite parents don't).
    #[serde(default = "default_unit_of_retention")]
    pub unit_of_retention: bool,
}

fn default_unit_of_retention() -> bool {
    true
}

impl ColumnDefinition {
    pub fn new(element_key: impl Into<String>, element_type: impl Into<String>) -> Self {
        let element_key = element_key.into();
        Self {
            element_name: Some(element_key.clone()),
            element_key,
            element_type: Some(element_type.into()),
            list_child_element_keys: None,
            unit_of_retention: true,
        }
    }
}

/// Column names that exist only on the client and must never be synced.
pub static CLIENT_ONLY_COLUMN_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["_id", "_row_etag", "_sync_state", "_conflict_type"].into_iter().collect()
});

/// Shared metadata column names that travel in dedicated row fields, never
/// in the generic value map.
pub static SHARED_COLUMN_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "_default_access",
        "_row_owner",
        "_group_read_only",
        "_group_modify",
        "_group_privileged",
        "_form_id",
        "_locale",
        "_savepoint_type",
        "_savepoint_timestamp",
        "_savepoint_creator",
    ]
    .into_iter()
    .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_sets_are_disjoint() {
        assert!(CLIENT_ONLY_COLUMN_NAMES.is_disjoint(&SHARED_COLUMN_NAMES));
    }

    #[test]
    fn test_new_column_defaults() {
        let col = ColumnDefinition::new("age", "integer");
        assert_eq!(col.element_key, "age");
        assert_eq!(col.element_type.as_deref(), Some("integer"));
        assert!(col.unit_of_retention);
    }
}
