//! Named advisory locks over lease records.
//!
//! A lock is a record `{owner, expires_at}` in the locks partition, claimed
//! with a compare-and-swap. Leases expire automatically, so a crashed
//! holder can never deadlock the resource: the next acquirer swaps the
//! expired record out. Acquisition retries with bounded exponential backoff
//! and fails with `StorageError::LockTimeout` (retryable) instead of
//! waiting forever.
//!
//! Locks are cooperative. They only serialize callers that ask for the same
//! (resource, purpose) pair; row writes never touch them.

use crate::storage_trait::{Partition, Result, StorageBackend, StorageError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tablesync_commons::constants::Partitions;

/// What a lock protects; part of the lock name, so different purposes on
/// the same resource do not contend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockPurpose {
    /// Table creation and deletion.
    TableStructure,
    /// File and manifest changes.
    NonPermissionsChange,
    /// ACL changes.
    PermissionsChange,
}

impl LockPurpose {
    fn as_str(&self) -> &'static str {
        match self {
            LockPurpose::TableStructure => "table_structure",
            LockPurpose::NonPermissionsChange => "non_permissions_change",
            LockPurpose::PermissionsChange => "permissions_change",
        }
    }
}

/// How long a lease lives before a crashed holder is presumed dead.
const LEASE_TTL_MS: i64 = 30_000;

/// Initial retry backoff; doubles per attempt up to [`MAX_BACKOFF`].
const INITIAL_BACKOFF: Duration = Duration::from_millis(10);
const MAX_BACKOFF: Duration = Duration::from_millis(250);

/// Default bounded wait before giving up with `LockTimeout`.
const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LeaseRecord {
    owner: String,
    expires_at_ms: i64,
}

/// A held lock. Release explicitly via [`LockManager::release`]; if the
/// holder dies instead, the lease expires on its own.
#[derive(Debug)]
pub struct LockLease {
    key: Vec<u8>,
    owner: String,
}

/// Acquires and releases named advisory locks.
#[derive(Clone)]
pub struct LockManager {
    backend: Arc<dyn StorageBackend>,
}

impl LockManager {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Acquires the lock for (resource, purpose), waiting up to the default
    /// bounded delay.
    pub fn acquire(&self, resource: &str, purpose: LockPurpose) -> Result<LockLease> {
        self.acquire_with_wait(resource, purpose, DEFAULT_MAX_WAIT)
    }

    /// Acquires with an explicit maximum wait.
    pub fn acquire_with_wait(
        &self,
        resource: &str,
        purpose: LockPurpose,
        max_wait: Duration,
    ) -> Result<LockLease> {
        let partition = Partition::new(Partitions::LOCKS);
        let key = format!("{}:{}", purpose.as_str(), resource).into_bytes();
        let owner = uuid::Uuid::new_v4().to_string();

        let deadline = Instant::now() + max_wait;
        let mut backoff = INITIAL_BACKOFF;

        loop {
            let now_ms = chrono::Utc::now().timestamp_millis();
            let lease = LeaseRecord { owner: owner.clone(), expires_at_ms: now_ms + LEASE_TTL_MS };
            let lease_bytes = serde_json::to_vec(&lease)
                .map_err(|e| StorageError::SerializationError(e.to_string()))?;

            let current = self.backend.get(&partition, &key)?;
            let claimed = match &current {
                None => self.backend.put_if_match(&partition, &key, None, &lease_bytes)?,
                Some(bytes) => {
                    let held: LeaseRecord = serde_json::from_slice(bytes)
                        .map_err(|e| StorageError::SerializationError(e.to_string()))?;
                    if held.expires_at_ms <= now_ms {
                        // expired lease of a dead holder; swap it out
                        self.backend.put_if_match(&partition, &key, Some(bytes), &lease_bytes)?
                    } else {
                        false
                    }
                }
            };

            if claimed {
                log::debug!("acquired lock {}:{}", purpose.as_str(), resource);
                return Ok(LockLease { key, owner });
            }

            if Instant::now() + backoff > deadline {
                return Err(StorageError::LockTimeout(format!(
                    "{}:{}",
                    purpose.as_str(),
                    resource
                )));
            }
            std::thread::sleep(backoff);
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    /// Releases a held lease.
    ///
    /// Only the owner's own lease is touched: if the lease already expired
    /// and another caller claimed the lock, release is a no-op rather than
    /// clobbering the new holder.
    pub fn release(&self, lease: LockLease) -> Result<()> {
        let partition = Partition::new(Partitions::LOCKS);
        if let Some(bytes) = self.backend.get(&partition, &lease.key)? {
            let held: LeaseRecord = serde_json::from_slice(&bytes)
                .map_err(|e| StorageError::SerializationError(e.to_string()))?;
            if held.owner == lease.owner {
                let expired = LeaseRecord { owner: held.owner, expires_at_ms: 0 };
                let expired_bytes = serde_json::to_vec(&expired)
                    .map_err(|e| StorageError::SerializationError(e.to_string()))?;
                // lost CAS means someone already stole the expired lease
                let _ = self
                    .backend
                    .put_if_match(&partition, &lease.key, Some(&bytes), &expired_bytes)?;
            }
        }
        Ok(())
    }
}
