// In: src/error.rs

//! This module defines the single, unified error type for the entire photon-codec
//! library. It uses the `thiserror` crate to provide ergonomic, context-aware
//! error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhotonError {
    // =========================================================================
    // === Validation Errors (local, raised before any transform or I/O)
    // =========================================================================
    #[error("Unsupported element type for photon data: {0}")]
    UnsupportedType(String),

    #[error("Photon data must be at least 3-dimensional (time, height, width, ...), got {0}D")]
    RankTooLow(usize),

    #[error("Photon counts cannot be negative")]
    NegativeValues,

    // =========================================================================
    // === Versioning Errors (decode-time, terminal for that call)
    // =========================================================================
    #[error("Malformed codec version string: {0:?} (expected \"<major>.<minor>\")")]
    MalformedVersion(String),

    #[error(
        "Unsupported photon codec version {found}: this codec reads version {supported_major}.x data only"
    )]
    IncompatibleVersion { found: String, supported_major: u32 },

    // =========================================================================
    // === Store Errors (propagated unchanged; retry policy belongs to the host)
    // =========================================================================
    #[error("Object not found in store: {0}")]
    NotFound(String),

    /// An error originating from the underlying I/O subsystem (e.g., file not
    /// found, permission denied).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // =========================================================================
    // === Codec Internals
    // =========================================================================
    /// An error from the Serde JSON library, typically while reading or writing
    /// the array metadata and attribute documents.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Zstd operation failed: {0}")]
    ZstdError(String),

    #[error("Buffer length mismatch: expected a multiple of {0}, got {1}")]
    BufferMismatch(usize, usize),

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),
}
