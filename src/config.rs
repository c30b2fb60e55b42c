// In: src/config.rs

//! The single source of truth for codec configuration.
//!
//! `CodecConfig` is created once at the application boundary (or taken as the
//! default) and handed to `PhotonCodec`; the codec holds no other state across
//! calls. Every field has a serde default so a partial configuration document
//! deserializes into the fixed, documented policy.

use serde::{Deserialize, Serialize};

use crate::store::CompressorSpec;
use crate::transform::AnscombeParams;

/// Configuration for the photon codec.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct CodecConfig {
    /// **The target number of frames per chunk along the time axis.**
    ///
    /// The one deliberate hard-coded policy choice: 100 frames per chunk
    /// balances sequential-read efficiency (one chunk is roughly one typical
    /// processing batch) against random access (a single arbitrary frame
    /// costs one full chunk decompression). Arrays shorter than this become
    /// a single chunk.
    #[serde(default = "default_chunk_frames")]
    pub chunk_frames: usize,

    /// The fixed compressor applied to every chunk.
    #[serde(default)]
    pub compressor: CompressorSpec,

    /// Forward-transform parameters written into the array attributes.
    /// The current codec version always uses the defaults.
    #[serde(default)]
    pub anscombe: AnscombeParams,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            chunk_frames: default_chunk_frames(),
            compressor: CompressorSpec::default(),
            anscombe: AnscombeParams::default(),
        }
    }
}

/// Helper for `serde` to provide the default for `chunk_frames`.
fn default_chunk_frames() -> usize {
    100
}
