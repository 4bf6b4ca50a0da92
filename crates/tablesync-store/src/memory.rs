//! In-memory storage backend.
//!
//! Partitions are `BTreeMap`s behind a single `RwLock`, which makes every
//! mutating trait method trivially atomic: `put_if_match`, `increment`, and
//! `batch` all run under the write lock. Ordered scans fall out of the
//! `BTreeMap` key order.
//!
//! This backend is production-representative for a single node and is the
//! substrate for the entire test suite.

use crate::storage_trait::{
    KvIterator, Operation, Partition, Result, StorageBackend, StorageError,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

type PartitionMap = BTreeMap<Vec<u8>, Vec<u8>>;

/// Thread-safe in-memory implementation of [`StorageBackend`].
#[derive(Default)]
pub struct InMemoryBackend {
    partitions: RwLock<HashMap<String, PartitionMap>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for InMemoryBackend {
    fn get(&self, partition: &Partition, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let partitions = self.partitions.read();
        Ok(partitions
            .get(partition.name())
            .and_then(|map| map.get(key).cloned()))
    }

    fn put(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()> {
        let mut partitions = self.partitions.write();
        partitions
            .entry(partition.name().to_string())
            .or_default()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn put_if_match(
        &self,
        partition: &Partition,
        key: &[u8],
        expected: Option<&[u8]>,
        value: &[u8],
    ) -> Result<bool> {
        let mut partitions = self.partitions.write();
        let map = partitions.entry(partition.name().to_string()).or_default();
        let current = map.get(key).map(|v| v.as_slice());
        if current != expected {
            return Ok(false);
        }
        map.insert(key.to_vec(), value.to_vec());
        Ok(true)
    }

    fn increment(&self, partition: &Partition, key: &[u8]) -> Result<i64> {
        let mut partitions = self.partitions.write();
        let map = partitions.entry(partition.name().to_string()).or_default();
        let current = match map.get(key) {
            Some(bytes) => {
                let array: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    StorageError::SerializationError(format!(
                        "counter at {:?} has invalid length {}",
                        key,
                        bytes.len()
                    ))
                })?;
                i64::from_be_bytes(array)
            }
            None => 0,
        };
        let next = current + 1;
        map.insert(key.to_vec(), next.to_be_bytes().to_vec());
        Ok(next)
    }

    fn delete(&self, partition: &Partition, key: &[u8]) -> Result<()> {
        let mut partitions = self.partitions.write();
        if let Some(map) = partitions.get_mut(partition.name()) {
            map.remove(key);
        }
        Ok(())
    }

    fn batch(&self, operations: Vec<Operation>) -> Result<()> {
        let mut partitions = self.partitions.write();
        for op in operations {
            match op {
                Operation::Put { partition, key, value } => {
                    partitions
                        .entry(partition.name().to_string())
                        .or_default()
                        .insert(key, value);
                }
                Operation::Delete { partition, key } => {
                    if let Some(map) = partitions.get_mut(partition.name()) {
                        map.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }

    fn scan(
        &self,
        partition: &Partition,
        prefix: Option<&[u8]>,
        start_key: Option<&[u8]>,
        limit: Option<usize>,
    ) -> Result<KvIterator<'_>> {
        let partitions = self.partitions.read();
        let Some(map) = partitions.get(partition.name()) else {
            return Ok(Box::new(std::iter::empty()));
        };

        // the effective lower bound is the larger of prefix and start_key,
        // so the prefix-mismatch break below only fires past the range
        let lower = match (prefix, start_key) {
            (Some(p), Some(s)) => if s >= p { s.to_vec() } else { p.to_vec() },
            (None, Some(s)) => s.to_vec(),
            (Some(p), None) => p.to_vec(),
            (None, None) => Vec::new(),
        };

        let prefix = prefix.map(|p| p.to_vec());
        let mut results: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
        for (key, value) in map.range((Bound::Included(lower), Bound::Unbounded)) {
            if let Some(p) = &prefix {
                if !key.starts_with(p) {
                    break;
                }
            }
            results.push((key.clone(), value.clone()));
            if let Some(limit) = limit {
                if results.len() >= limit {
                    break;
                }
            }
        }
        Ok(Box::new(results.into_iter()))
    }

    fn create_partition(&self, partition: &Partition) -> Result<()> {
        let mut partitions = self.partitions.write();
        partitions.entry(partition.name().to_string()).or_default();
        Ok(())
    }

    fn drop_partition(&self, partition: &Partition) -> Result<()> {
        let mut partitions = self.partitions.write();
        partitions.remove(partition.name());
        Ok(())
    }
}
