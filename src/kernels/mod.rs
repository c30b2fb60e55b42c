//! This module contains the pure, stateless byte-level kernels used by the
//! chunked store layer: byte-plane shuffling and Zstandard compression.

pub mod shuffle;
pub mod zstd;
