//! Table-level access control: permissions, roles, and ACL entries.

use super::scope::Scope;
use serde::{Deserialize, Serialize};

/// A single capability that can be checked against a table.
///
/// The `Unfiltered*` tiers additionally bypass per-row filter scopes; the
/// plain tiers see only the rows their scopes admit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TablePermission {
    Read,
    Write,
    Delete,
    UnfilteredRead,
    UnfilteredWrite,
    UnfilteredDelete,
    Administer,
}

/// Role granted to a scope by an ACL entry. Each role maps to a fixed
/// permission set; permission checks take the most permissive role across
/// the caller's scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableRole {
    None,
    FilteredReader,
    FilteredWriter,
    UnfilteredReaderFilteredWriter,
    Administer,
}

impl TableRole {
    /// The permissions this role grants.
    pub fn permissions(&self) -> &'static [TablePermission] {
        use TablePermission::*;
        match self {
            TableRole::None => &[],
            TableRole::FilteredReader => &[Read],
            TableRole::FilteredWriter => &[Read, Write, Delete],
            TableRole::UnfilteredReaderFilteredWriter => &[Read, UnfilteredRead, Write, Delete],
            TableRole::Administer => &[
                Read,
                Write,
                Delete,
                UnfilteredRead,
                UnfilteredWrite,
                UnfilteredDelete,
                Administer,
            ],
        }
    }

    pub fn grants(&self, permission: TablePermission) -> bool {
        self.permissions().contains(&permission)
    }
}

/// An ACL entry: a role granted to a scope on one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableAcl {
    pub scope: Scope,
    pub role: TableRole,
}
