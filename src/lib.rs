//! This file is the root of the `photon_codec` Rust crate.
//!
//! A storage codec for photon-limited imaging movies. Raw photon counts are
//! variance-stabilized with the generalized Anscombe transform, then written
//! as a chunked, compressed, lazily-readable array at a deterministic
//! schema-addressed path. Decode opens the array lazily and returns it still
//! in the stabilized domain; the inverse transform is the caller's call.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod codec;
pub mod config;
pub mod error;
pub mod kernels;
pub mod path;
pub mod registry;
pub mod store;
pub mod transform;
pub mod types;
pub mod validate;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use codec::{
    CodecVersion, PhotonCodec, SchemaCodec, StoredArrayMetadata, TransformAttributes, CODEC_NAME,
    CODEC_VERSION, TRANSFORM_NAME,
};
pub use config::CodecConfig;
pub use error::PhotonError;
pub use path::{build_path, KeyValue, LogicalAddress};
pub use registry::CodecRegistry;
pub use store::{DirectoryStore, ObjectStore, ZarrArray};
pub use transform::AnscombeParams;
pub use types::{CountArray, ElementType};
pub use validate::validate;
