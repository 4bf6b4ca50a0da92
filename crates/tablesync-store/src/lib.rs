//! # tablesync-store
//!
//! Storage layer for TableSync.
//!
//! The core protocol code never talks to a concrete database; it consumes
//! the narrow [`StorageBackend`] trait defined here, which provides exactly
//! the primitives the sync protocol needs: keyed get/put/delete, atomic
//! batches, compare-and-swap puts, atomically incremented counters, and
//! cursor-resumable ordered scans. On top of that sit the typed
//! [`EntityStore`] trait, the per-table [`Sequencer`], and the advisory
//! [`LockManager`].
//!
//! [`InMemoryBackend`] is the bundled implementation and the substrate for
//! every test; a durable engine slots in behind the same trait.

pub mod entity_store;
pub mod locks;
pub mod memory;
pub mod sequencer;
pub mod storage_trait;

pub use entity_store::EntityStore;
pub use locks::{LockLease, LockManager, LockPurpose};
pub use memory::InMemoryBackend;
pub use sequencer::Sequencer;
pub use storage_trait::{KvIterator, Operation, Partition, Result, StorageBackend, StorageError};
