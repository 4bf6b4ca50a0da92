//! Storage backend abstraction.
//!
//! A backend organizes data into named [`Partition`]s of byte-keyed
//! records. Partitions map to whatever the engine natively offers (column
//! families, trees, key prefixes, in-memory maps); the sync protocol only
//! assumes that keys within a partition scan in lexicographic byte order.
//!
//! Beyond plain CRUD, backends must supply the three primitives the
//! versioning protocol is built on:
//! - [`StorageBackend::put_if_match`]: atomic compare-and-swap of a single
//!   record; the unit of optimistic concurrency for row and table-entry
//!   updates and the basis of the advisory lock leases
//! - [`StorageBackend::increment`]: an atomically incremented counter,
//!   used by the per-table sequencer
//! - [`StorageBackend::scan`]: ordered, prefix-filtered, resumable range
//!   reads backing the websafe cursors

use std::fmt;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone)]
pub enum StorageError {
    /// Partition not found
    PartitionNotFound(String),

    /// Generic I/O error from underlying storage
    IoError(String),

    /// Serialization/deserialization error
    SerializationError(String),

    /// Advisory lock could not be acquired within the bounded wait.
    /// Retryable by the caller.
    LockTimeout(String),

    /// Other errors
    Other(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::PartitionNotFound(p) => write!(f, "Partition not found: {}", p),
            StorageError::IoError(msg) => write!(f, "I/O error: {}", msg),
            StorageError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            StorageError::LockTimeout(msg) => write!(f, "Lock acquisition timed out: {}", msg),
            StorageError::Other(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// A logical partition of data within a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Partition {
    name: String,
}

impl Partition {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<&str> for Partition {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Partition {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// A single operation in an atomic batch.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Insert or update a key-value pair
    Put {
        partition: Partition,
        key: Vec<u8>,
        value: Vec<u8>,
    },

    /// Delete a key
    Delete { partition: Partition, key: Vec<u8> },
}

/// Iterator over (key, value) pairs returned by a scan.
pub type KvIterator<'a> = Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + Send + 'a>;

/// Trait for pluggable storage backend implementations.
///
/// Implementations must be thread-safe; the server invokes them from many
/// request threads concurrently. `put_if_match` and `increment` must be
/// atomic with respect to every other mutation of the same key.
pub trait StorageBackend: Send + Sync {
    /// Retrieves a value by key. `Ok(None)` if the key doesn't exist.
    fn get(&self, partition: &Partition, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Stores a key-value pair, overwriting any existing value.
    fn put(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()>;

    /// Atomically stores `value` only if the current value equals
    /// `expected`. `expected = None` means "create only if absent".
    ///
    /// Returns whether the swap happened; `Ok(false)` is a lost race, not
    /// an error.
    fn put_if_match(
        &self,
        partition: &Partition,
        key: &[u8],
        expected: Option<&[u8]>,
        value: &[u8],
    ) -> Result<bool>;

    /// Atomically increments the counter stored at `key` and returns the
    /// new value. A missing counter starts at zero, so the first call
    /// returns 1.
    fn increment(&self, partition: &Partition, key: &[u8]) -> Result<i64>;

    /// Deletes a key. `Ok(())` even if the key doesn't exist (idempotent).
    fn delete(&self, partition: &Partition, key: &[u8]) -> Result<()>;

    /// Executes multiple operations atomically; either all are applied or
    /// none.
    fn batch(&self, operations: Vec<Operation>) -> Result<()>;

    /// Scans keys in lexicographic order.
    ///
    /// - `prefix`: only keys starting with these bytes
    /// - `start_key`: resume scanning at this key (inclusive)
    /// - `limit`: at most this many entries
    fn scan(
        &self,
        partition: &Partition,
        prefix: Option<&[u8]>,
        start_key: Option<&[u8]>,
        limit: Option<usize>,
    ) -> Result<KvIterator<'_>>;

    /// Creates a partition. `Ok(())` if it already exists (idempotent).
    fn create_partition(&self, partition: &Partition) -> Result<()>;

    /// Deletes a partition and all its data.
    fn drop_partition(&self, partition: &Partition) -> Result<()>;
}
