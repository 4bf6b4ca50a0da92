//! Per-table sequence number issuer.

use crate::storage_trait::{Partition, Result, StorageBackend};
use std::sync::Arc;
use tablesync_commons::constants::Partitions;
use tablesync_commons::{SequenceValue, StorageKey, TableId};

/// Issues strictly increasing sequence values per table.
///
/// Log entries carry these values to give each table's mutation history a
/// total order independent of wall-clock time. Backed by the storage
/// backend's atomic counter, so values are unique across concurrent writer
/// threads. If the counter store is unavailable the error propagates: a
/// mutation must never be logged without a sequence value.
#[derive(Clone)]
pub struct Sequencer {
    backend: Arc<dyn StorageBackend>,
}

impl Sequencer {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Returns the next sequence value for the table. No gaps are promised,
    /// only uniqueness and strict increase.
    pub fn next_value(&self, table_id: &TableId) -> Result<SequenceValue> {
        let partition = Partition::new(Partitions::SEQUENCES);
        let value = self.backend.increment(&partition, &table_id.storage_key())?;
        Ok(SequenceValue::new(value))
    }
}
