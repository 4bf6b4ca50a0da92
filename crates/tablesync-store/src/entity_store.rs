//! Type-safe entity storage with generic key types.
//!
//! `EntityStore<K, V>` layers typed CRUD over a [`StorageBackend`]
//! partition: keys are encoded through [`StorageKey`] so a store for one
//! entity type cannot be handed another type's key, and values serialize
//! through serde (JSON by default).
//!
//! ```text
//! EntityStore<K, V>        typed entity CRUD (this file)
//!     |
//! StorageBackend           generic K/V operations (storage_trait.rs)
//!     |
//! InMemoryBackend / ...    actual storage implementation
//! ```

use crate::storage_trait::{Operation, Partition, Result, StorageBackend, StorageError};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tablesync_commons::StorageKey;

/// Trait for typed entity storage with automatic serialization.
///
/// Implementors supply `backend()` and `partition()`; everything else is
/// provided. `get_raw` and `put_if_unchanged` expose the backend's
/// compare-and-swap at the entity level: callers capture the raw bytes they
/// read and pass them back as the expected image, so a concurrent writer
/// that changed *anything* about the record makes the swap fail.
pub trait EntityStore<K, V>
where
    K: StorageKey,
    V: Serialize + DeserializeOwned + Send + Sync,
{
    /// Returns a reference to the storage backend.
    fn backend(&self) -> &Arc<dyn StorageBackend>;

    /// Returns the partition name for this entity type.
    fn partition(&self) -> &str;

    fn serialize(&self, entity: &V) -> Result<Vec<u8>> {
        serde_json::to_vec(entity).map_err(|e| StorageError::SerializationError(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<V> {
        serde_json::from_slice(bytes).map_err(|e| StorageError::SerializationError(e.to_string()))
    }

    /// Stores an entity unconditionally.
    fn put(&self, key: &K, entity: &V) -> Result<()> {
        let partition = Partition::new(self.partition());
        let value = self.serialize(entity)?;
        self.backend().put(&partition, &key.storage_key(), &value)
    }

    /// Retrieves an entity by key.
    fn get(&self, key: &K) -> Result<Option<V>> {
        match self.get_raw(key)? {
            Some(bytes) => Ok(Some(self.deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Retrieves the raw serialized bytes of an entity, for use as the
    /// expected image in a later `put_if_unchanged`.
    fn get_raw(&self, key: &K) -> Result<Option<Vec<u8>>> {
        let partition = Partition::new(self.partition());
        self.backend().get(&partition, &key.storage_key())
    }

    /// Atomically replaces an entity only if its stored bytes still equal
    /// `expected` (`None` = "create only if absent"). Returns whether the
    /// swap happened.
    fn put_if_unchanged(&self, key: &K, expected: Option<&[u8]>, entity: &V) -> Result<bool> {
        let partition = Partition::new(self.partition());
        let value = self.serialize(entity)?;
        self.backend()
            .put_if_match(&partition, &key.storage_key(), expected, &value)
    }

    /// Deletes an entity by key (idempotent).
    fn delete(&self, key: &K) -> Result<()> {
        let partition = Partition::new(self.partition());
        self.backend().delete(&partition, &key.storage_key())
    }

    /// Builds a batch `Put` operation for this store, for composing
    /// cross-partition atomic writes.
    fn put_op(&self, key: &K, entity: &V) -> Result<Operation> {
        Ok(Operation::Put {
            partition: Partition::new(self.partition()),
            key: key.storage_key(),
            value: self.serialize(entity)?,
        })
    }

    /// Builds a batch `Delete` operation for this store.
    fn delete_op(&self, key: &K) -> Operation {
        Operation::Delete {
            partition: Partition::new(self.partition()),
            key: key.storage_key(),
        }
    }

    /// Scans a page of entities in key order.
    ///
    /// Returns (raw key, entity) pairs; the raw key of the last pair feeds
    /// the continuation cursor.
    fn scan_page(
        &self,
        prefix: Option<&[u8]>,
        start_key: Option<&[u8]>,
        limit: Option<usize>,
    ) -> Result<Vec<(Vec<u8>, V)>> {
        let partition = Partition::new(self.partition());
        let iter = self.backend().scan(&partition, prefix, start_key, limit)?;

        let mut results = Vec::new();
        for (key_bytes, value_bytes) in iter {
            let entity = self.deserialize(&value_bytes)?;
            results.push((key_bytes, entity));
        }
        Ok(results)
    }
}
