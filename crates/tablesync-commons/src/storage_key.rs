//! Storage key trait for type-safe key serialization.
//!
//! Backend partitions store keys in lexicographic (byte-by-byte) order, and
//! paginated scans resume from a raw key, so every key type must commit to a
//! stable byte encoding whose ordering matches the logical ordering of the
//! type. Plain UTF-8 bytes already sort correctly for string identifiers;
//! numeric keys use big-endian encoding for the same reason.
//!
//! The trait is an explicit contract, separate from `AsRef<[u8]>`: composite
//! keys (e.g. an ACL key of table id plus scope) must encode *all* of their
//! components, which `AsRef` implementations have historically gotten wrong.

/// Trait for keys that can be serialized for storage in an `EntityStore`.
///
/// # Ordering Guarantees
///
/// The encoded bytes must sort in the same order as the logical key:
/// - String identifiers encode as their UTF-8 bytes
/// - Signed counters encode big-endian (all values produced by the
///   sequencer are non-negative, so big-endian order equals numeric order)
/// - Composite keys encode components separated by `b':'`
pub trait StorageKey: Clone + Send + Sync {
    /// Encodes the key as bytes for storage.
    fn storage_key(&self) -> Vec<u8>;
}

impl StorageKey for String {
    fn storage_key(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}
