//! Typed identifiers used throughout TableSync.
//!
//! Wrapping the raw strings prevents wrong-key bugs at the store layer: a
//! `RowId` cannot be passed where a `TableId` is expected, and each id type
//! owns its storage encoding.

use crate::storage_key::StorageKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a synchronized table. Client-chosen, stable, unique within
/// the deployment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(String);

impl TableId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for TableId {
    fn storage_key(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }
}

/// Identifier of a row within a table. Client-assigned, unique per table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for RowId {
    fn storage_key(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }
}

/// Identifier of a user as resolved by the upstream authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonically increasing per-table sequence value assigned to log
/// entries. The authoritative ordering for "changes since" queries,
/// independent of wall-clock time.
///
/// Storage key format: 8-byte big-endian, so byte order equals numeric
/// order for the non-negative values the sequencer issues.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SequenceValue(i64);

impl SequenceValue {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// The sequence value immediately after this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Encodes as big-endian bytes for ordered storage.
    pub fn to_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Parses from big-endian bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        if bytes.len() != 8 {
            return Err(format!("invalid sequence key length: {}", bytes.len()));
        }
        let mut array = [0u8; 8];
        array.copy_from_slice(bytes);
        Ok(Self(i64::from_be_bytes(array)))
    }
}

impl fmt::Display for SequenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for SequenceValue {
    fn storage_key(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }
}
