//! Row-level access descriptor.

use serde::{Deserialize, Serialize};

/// Default access granted by a row to callers outside its owner and group
/// fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Access {
    /// Defer entirely to the table-level ACL.
    #[default]
    Default,
    /// Anyone the table ACL admits may read and modify.
    Modify,
    /// Anyone may read; only the owner or privileged group may modify.
    ReadOnly,
    /// Invisible except to the owner and the privileged group.
    Hidden,
}

/// Access-control descriptor attached to a row.
///
/// `default_access` governs callers not named by the other fields;
/// `row_owner` and the group fields grant additional capabilities to
/// specific scopes. A row carrying the all-defaults value defers entirely
/// to the table ACL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FilterScope {
    #[serde(default)]
    pub default_access: Access,
    #[serde(default)]
    pub row_owner: Option<String>,
    #[serde(default)]
    pub group_read_only: Option<String>,
    #[serde(default)]
    pub group_modify: Option<String>,
    #[serde(default)]
    pub group_privileged: Option<String>,
}

impl FilterScope {
    /// The empty filter: default access, no owner, no groups.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_owner(default_access: Access, owner: impl Into<String>) -> Self {
        Self {
            default_access,
            row_owner: Some(owner.into()),
            ..Self::default()
        }
    }
}
