// In: src/store/mod.rs

//! The chunked store layer.
//!
//! The codec depends on storage only through the narrow [`ObjectStore`]
//! byte-namespace trait, so the concrete backend (local disk, object store)
//! is swappable without touching encode/decode logic. On top of it,
//! [`array`] implements the chunked-array format: metadata document,
//! attribute document, and independently compressed chunk objects.

pub mod array;
pub mod directory;

pub use array::{open_array, write_array, write_attrs, ArrayMeta, CompressorSpec, ZarrArray};
pub use directory::DirectoryStore;

use crate::error::PhotonError;

/// A byte-level key-value namespace.
///
/// Keys are `/`-separated relative paths. Implementations must be usable from
/// multiple threads; the codec itself performs no locking (callers serialize
/// writes to a given path externally).
pub trait ObjectStore: Send + Sync {
    /// Writes `bytes` under `key`, replacing any existing object.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), PhotonError>;

    /// Reads the object at `key`. A missing object is `PhotonError::NotFound`.
    fn get(&self, key: &str) -> Result<Vec<u8>, PhotonError>;

    /// Returns `true` if an object exists at `key`.
    fn contains(&self, key: &str) -> Result<bool, PhotonError>;
}
