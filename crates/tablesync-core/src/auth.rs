//! Access filtering.
//!
//! Two layers compose here:
//! - [`AuthFilter`]: pure decision functions over (caller scopes, requested
//!   permission, ACL entries / row filter scope). No storage, no hidden
//!   state, unit-testable in isolation.
//! - [`TablesUserPermissions`]: the capability surface the managers consume
//!   for one caller. The production implementation
//!   [`AclUserPermissions`] resolves the caller's scope set against
//!   persisted ACL entries, caching the effective role per table for the
//!   lifetime of the request.

use crate::error::{Result, SyncError};
use dashmap::DashMap;
use tablesync_commons::{
    Access, FilterScope, Scope, ScopeType, TableAcl, TableId, TablePermission, TableRole, UserId,
};
use tablesync_tables::AclStore;

/// Per-caller permission surface consumed by the managers.
///
/// Implementations must be pure functions of the caller's scopes and the
/// ACL / filter-scope state passed through them; the managers decide when
/// the unfiltered permission tiers bypass row filtering.
pub trait TablesUserPermissions: Send + Sync {
    /// Identity of the caller as resolved upstream.
    fn user_id(&self) -> &UserId;

    /// All scopes the caller participates in.
    fn scopes(&self) -> &[Scope];

    /// Whether the caller holds `permission` on the table.
    fn has_permission(&self, table_id: &TableId, permission: TablePermission) -> Result<bool>;

    /// Whether the row filter scope admits the caller for `permission`.
    fn has_filter_scope(&self, permission: TablePermission, filter_scope: &FilterScope) -> bool;

    /// Errors with `PermissionDenied` unless `permission` is held.
    fn check_permission(&self, table_id: &TableId, permission: TablePermission) -> Result<()> {
        if self.has_permission(table_id, permission)? {
            Ok(())
        } else {
            Err(SyncError::PermissionDenied(format!(
                "table {} permission {:?} denied to user {}",
                table_id,
                permission,
                self.user_id()
            )))
        }
    }
}

/// Pure access-control decision functions.
pub struct AuthFilter;

impl AuthFilter {
    /// Most permissive role any of the caller's scopes is granted.
    pub fn effective_role(scopes: &[Scope], acls: &[TableAcl]) -> TableRole {
        let mut best = TableRole::None;
        for acl in acls {
            if scopes.contains(&acl.scope) && role_rank(acl.role) > role_rank(best) {
                best = acl.role;
            }
        }
        best
    }

    /// Table-level decision: does the best applicable role grant the
    /// permission? No matching ACL entry means deny.
    pub fn has_permission(
        scopes: &[Scope],
        acls: &[TableAcl],
        permission: TablePermission,
    ) -> bool {
        Self::effective_role(scopes, acls).grants(permission)
    }

    /// Row-level decision against a filter scope.
    ///
    /// The owner and privileged group always pass. The modify group may
    /// read and write; the read-only group may read. Everyone else gets
    /// what `default_access` grants: `Hidden` nothing, `ReadOnly` reads,
    /// `Modify` reads and writes, `Default` defers to the table ACL (which
    /// the caller already passed to get here).
    pub fn row_scope_allows(
        scopes: &[Scope],
        permission: TablePermission,
        filter_scope: &FilterScope,
    ) -> bool {
        let owner = holds_user(scopes, filter_scope.row_owner.as_deref());
        let privileged = holds_group(scopes, filter_scope.group_privileged.as_deref());
        if owner || privileged {
            return true;
        }

        let modify = holds_group(scopes, filter_scope.group_modify.as_deref());
        if wants_write(permission) {
            modify
                || matches!(filter_scope.default_access, Access::Default | Access::Modify)
        } else {
            modify
                || holds_group(scopes, filter_scope.group_read_only.as_deref())
                || filter_scope.default_access != Access::Hidden
        }
    }
}

fn wants_write(permission: TablePermission) -> bool {
    use TablePermission::*;
    matches!(permission, Write | Delete | UnfilteredWrite | UnfilteredDelete | Administer)
}

fn holds_user(scopes: &[Scope], user: Option<&str>) -> bool {
    match user {
        Some(user) => scopes.iter().any(|s| {
            s.scope_type == ScopeType::User && s.value.as_deref() == Some(user)
        }),
        None => false,
    }
}

fn holds_group(scopes: &[Scope], group: Option<&str>) -> bool {
    match group {
        Some(group) => scopes.iter().any(|s| {
            s.scope_type == ScopeType::Group && s.value.as_deref() == Some(group)
        }),
        None => false,
    }
}

fn role_rank(role: TableRole) -> u8 {
    match role {
        TableRole::None => 0,
        TableRole::FilteredReader => 1,
        TableRole::FilteredWriter => 2,
        TableRole::UnfilteredReaderFilteredWriter => 3,
        TableRole::Administer => 4,
    }
}

/// Production [`TablesUserPermissions`]: the caller's scope set resolved
/// against persisted ACL entries. Built once per request; effective roles
/// are cached per table for that lifetime.
pub struct AclUserPermissions {
    user_id: UserId,
    scopes: Vec<Scope>,
    acl_store: AclStore,
    role_cache: DashMap<TableId, TableRole>,
}

impl AclUserPermissions {
    pub fn new(user_id: UserId, groups: &[String], acl_store: AclStore) -> Self {
        let mut scopes = vec![Scope::default_scope(), Scope::user(user_id.as_str())];
        scopes.extend(groups.iter().map(Scope::group));
        Self { user_id, scopes, acl_store, role_cache: DashMap::new() }
    }

    fn effective_role(&self, table_id: &TableId) -> Result<TableRole> {
        if let Some(role) = self.role_cache.get(table_id) {
            return Ok(*role);
        }
        let entries = self.acl_store.entries_for_table(table_id)?;
        let role = AuthFilter::effective_role(&self.scopes, &entries);
        self.role_cache.insert(table_id.clone(), role);
        Ok(role)
    }
}

impl TablesUserPermissions for AclUserPermissions {
    fn user_id(&self) -> &UserId {
        &self.user_id
    }

    fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    fn has_permission(&self, table_id: &TableId, permission: TablePermission) -> Result<bool> {
        Ok(self.effective_role(table_id)?.grants(permission))
    }

    fn has_filter_scope(&self, permission: TablePermission, filter_scope: &FilterScope) -> bool {
        AuthFilter::row_scope_allows(&self.scopes, permission, filter_scope)
    }
}

/// Permissions object granting everything. For trusted internal callers
/// (startup tasks) and tests.
pub struct AllowAllPermissions {
    user_id: UserId,
    scopes: Vec<Scope>,
}

impl AllowAllPermissions {
    pub fn new(user_id: impl Into<String>) -> Self {
        let user_id = UserId::new(user_id);
        let scopes = vec![Scope::default_scope(), Scope::user(user_id.as_str())];
        Self { user_id, scopes }
    }
}

impl TablesUserPermissions for AllowAllPermissions {
    fn user_id(&self) -> &UserId {
        &self.user_id
    }

    fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    fn has_permission(&self, _table_id: &TableId, _permission: TablePermission) -> Result<bool> {
        Ok(true)
    }

    fn has_filter_scope(&self, _permission: TablePermission, _filter_scope: &FilterScope) -> bool {
        true
    }
}
