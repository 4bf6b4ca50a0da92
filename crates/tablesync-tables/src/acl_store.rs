//! Store for table-level ACL entries.

use std::sync::Arc;
use tablesync_commons::constants::Partitions;
use tablesync_commons::{Scope, ScopeType, StorageKey, TableAcl, TableId};
use tablesync_store::{EntityStore, StorageBackend};

/// Key of an ACL entry: (table id, scope).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclKey {
    pub table_id: TableId,
    pub scope: Scope,
}

impl AclKey {
    pub fn new(table_id: TableId, scope: Scope) -> Self {
        Self { table_id, scope }
    }
}

impl StorageKey for AclKey {
    fn storage_key(&self) -> Vec<u8> {
        let scope_type = match self.scope.scope_type {
            ScopeType::Default => "DEFAULT",
            ScopeType::User => "USER",
            ScopeType::Group => "GROUP",
        };
        let mut key = self.table_id.storage_key();
        key.push(b':');
        key.extend_from_slice(scope_type.as_bytes());
        key.push(b':');
        if let Some(value) = &self.scope.value {
            key.extend_from_slice(value.as_bytes());
        }
        key
    }
}

/// Store for [`TableAcl`] entries.
#[derive(Clone)]
pub struct AclStore {
    backend: Arc<dyn StorageBackend>,
}

impl AclStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Prefix covering every ACL entry of a table.
    pub fn table_prefix(table_id: &TableId) -> Vec<u8> {
        let mut prefix = table_id.storage_key();
        prefix.push(b':');
        prefix
    }

    /// All ACL entries of a table.
    pub fn entries_for_table(&self, table_id: &TableId) -> tablesync_store::Result<Vec<TableAcl>> {
        Ok(self
            .scan_page(Some(&Self::table_prefix(table_id)), None, None)?
            .into_iter()
            .map(|(_, acl)| acl)
            .collect())
    }
}

impl EntityStore<AclKey, TableAcl> for AclStore {
    fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    fn partition(&self) -> &str {
        Partitions::TABLE_ACLS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablesync_commons::TableRole;

    fn acl(scope: Scope, role: TableRole) -> TableAcl {
        TableAcl { scope, role }
    }

    #[test]
    fn test_entries_scoped_per_table() {
        let store = AclStore::new(Arc::new(tablesync_store::InMemoryBackend::new()));
        let people = TableId::new("people");
        let places = TableId::new("places");

        let a = acl(Scope::user("alice"), TableRole::Administer);
        let b = acl(Scope::default_scope(), TableRole::FilteredReader);
        let c = acl(Scope::user("alice"), TableRole::FilteredWriter);
        store.put(&AclKey::new(people.clone(), a.scope.clone()), &a).unwrap();
        store.put(&AclKey::new(people.clone(), b.scope.clone()), &b).unwrap();
        store.put(&AclKey::new(places.clone(), c.scope.clone()), &c).unwrap();

        let people_acls = store.entries_for_table(&people).unwrap();
        assert_eq!(people_acls.len(), 2);
        let places_acls = store.entries_for_table(&places).unwrap();
        assert_eq!(places_acls.len(), 1);
        assert_eq!(places_acls[0].role, TableRole::FilteredWriter);
    }

    #[test]
    fn test_lookup_by_scope() {
        let store = AclStore::new(Arc::new(tablesync_store::InMemoryBackend::new()));
        let people = TableId::new("people");
        let entry = acl(Scope::group("field-team"), TableRole::FilteredWriter);
        store.put(&AclKey::new(people.clone(), entry.scope.clone()), &entry).unwrap();

        let found = store.get(&AclKey::new(people.clone(), Scope::group("field-team"))).unwrap();
        assert_eq!(found, Some(entry));
        let missing = store.get(&AclKey::new(people, Scope::group("other"))).unwrap();
        assert_eq!(missing, None);
    }
}
