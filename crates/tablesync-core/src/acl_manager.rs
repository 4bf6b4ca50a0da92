//! Table ACL administration.

use crate::app_context::AppContext;
use crate::auth::TablesUserPermissions;
use crate::error::{Result, SyncError};
use std::sync::Arc;
use tablesync_commons::{Scope, TableAcl, TableId, TablePermission, TableRole};
use tablesync_store::{EntityStore, LockPurpose};
use tablesync_tables::AclKey;

/// Reads and edits a table's ACL entries. All operations require the
/// `Administer` permission; edits serialize under the permissions-change
/// lock so concurrent grants cannot interleave with revocations.
pub struct AclManager {
    ctx: Arc<AppContext>,
    permissions: Arc<dyn TablesUserPermissions>,
}

impl AclManager {
    pub fn new(ctx: Arc<AppContext>, permissions: Arc<dyn TablesUserPermissions>) -> Self {
        Self { ctx, permissions }
    }

    fn check_table(&self, table_id: &TableId) -> Result<()> {
        self.permissions.check_permission(table_id, TablePermission::Administer)?;
        if self.ctx.table_entries().get(table_id)?.is_none() {
            return Err(SyncError::not_found(format!("table {}", table_id)));
        }
        Ok(())
    }

    /// All ACL entries of a table.
    pub fn get_acls(&self, table_id: &TableId) -> Result<Vec<TableAcl>> {
        self.check_table(table_id)?;
        Ok(self.ctx.acls().entries_for_table(table_id)?)
    }

    /// The ACL entry for one scope.
    pub fn get_acl(&self, table_id: &TableId, scope: &Scope) -> Result<TableAcl> {
        self.check_table(table_id)?;
        self.ctx
            .acls()
            .get(&AclKey::new(table_id.clone(), scope.clone()))?
            .ok_or_else(|| SyncError::not_found(format!("acl {} on table {}", scope, table_id)))
    }

    /// Grants (or replaces) a role for a scope.
    pub fn set_acl(&self, table_id: &TableId, scope: Scope, role: TableRole) -> Result<TableAcl> {
        self.check_table(table_id)?;
        let lease = self
            .ctx
            .locks()
            .acquire(table_id.as_str(), LockPurpose::PermissionsChange)?;
        let acl = TableAcl { scope: scope.clone(), role };
        let result = self.ctx.acls().put(&AclKey::new(table_id.clone(), scope), &acl);
        self.ctx.locks().release(lease)?;
        result?;
        log::info!("set acl {} = {:?} on table {}", acl.scope, role, table_id);
        Ok(acl)
    }

    /// Revokes a scope's entry. Idempotent.
    pub fn delete_acl(&self, table_id: &TableId, scope: &Scope) -> Result<()> {
        self.check_table(table_id)?;
        let lease = self
            .ctx
            .locks()
            .acquire(table_id.as_str(), LockPurpose::PermissionsChange)?;
        let result = self.ctx.acls().delete(&AclKey::new(table_id.clone(), scope.clone()));
        self.ctx.locks().release(lease)?;
        result?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AclUserPermissions, AllowAllPermissions};
    use crate::table_manager::TableManager;
    use tablesync_commons::ColumnDefinition;
    use tablesync_commons::UserId;
    use tablesync_store::InMemoryBackend;

    fn setup() -> (Arc<AppContext>, AclManager, TableId) {
        let ctx = Arc::new(AppContext::new(Arc::new(InMemoryBackend::new())));
        let admin: Arc<dyn TablesUserPermissions> = Arc::new(AllowAllPermissions::new("admin"));
        let table_id = TableId::new("people");
        TableManager::new(ctx.clone(), admin.clone())
            .create_table(&table_id, vec![ColumnDefinition::new("name", "string")])
            .unwrap();
        let manager = AclManager::new(ctx.clone(), admin);
        (ctx, manager, table_id)
    }

    #[test]
    fn test_set_get_delete_acl() {
        let (_ctx, manager, table_id) = setup();
        manager
            .set_acl(&table_id, Scope::user("bob"), TableRole::FilteredReader)
            .unwrap();

        let acl = manager.get_acl(&table_id, &Scope::user("bob")).unwrap();
        assert_eq!(acl.role, TableRole::FilteredReader);

        // creator's administer grant plus bob
        assert_eq!(manager.get_acls(&table_id).unwrap().len(), 2);

        manager.delete_acl(&table_id, &Scope::user("bob")).unwrap();
        assert!(matches!(
            manager.get_acl(&table_id, &Scope::user("bob")).unwrap_err(),
            SyncError::NotFound(_)
        ));
    }

    #[test]
    fn test_granted_role_takes_effect_for_user() {
        let (ctx, manager, table_id) = setup();
        manager
            .set_acl(&table_id, Scope::user("bob"), TableRole::FilteredWriter)
            .unwrap();

        let bob = AclUserPermissions::new(UserId::new("bob"), &[], ctx.acls().clone());
        assert!(bob.has_permission(&table_id, TablePermission::Write).unwrap());
        assert!(!bob.has_permission(&table_id, TablePermission::Administer).unwrap());
    }

    #[test]
    fn test_acl_ops_on_missing_table_fail() {
        let (_ctx, manager, _table_id) = setup();
        let missing = TableId::new("absent");
        assert!(matches!(
            manager.get_acls(&missing).unwrap_err(),
            SyncError::NotFound(_)
        ));
    }
}
