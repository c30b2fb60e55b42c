//! This module contains the pure, stateless kernels for performing Zstandard
//! compression and decompression.
//!
//! This is the final stage of the chunk compression pipeline. It takes a byte
//! buffer that has already been byte-shuffled and applies a modern,
//! general-purpose entropy coder to achieve the final compressed size. This
//! module is a safe, panic-free wrapper around the `zstd` crate.

use std::io::Write;

use crate::error::PhotonError;

/// Compresses a byte slice, prepending the uncompressed length as a u64 LE
/// header so decode can verify and pre-allocate.
pub fn encode(input_bytes: &[u8], level: i32) -> Result<Vec<u8>, PhotonError> {
    if input_bytes.is_empty() {
        return Ok(Vec::new());
    }

    let mut output_buf = Vec::with_capacity(input_bytes.len());

    let uncompressed_len: u64 = input_bytes.len() as u64;
    output_buf.extend_from_slice(&uncompressed_len.to_le_bytes());

    let mut encoder = zstd::stream::Encoder::new(&mut output_buf, level)
        .map_err(|e| PhotonError::ZstdError(e.to_string()))?;
    encoder
        .write_all(input_bytes)
        .map_err(|e| PhotonError::ZstdError(e.to_string()))?;
    // `finish` is essential to finalize the Zstd frame.
    encoder
        .finish()
        .map_err(|e| PhotonError::ZstdError(e.to_string()))?;

    Ok(output_buf)
}

/// Decompresses a buffer produced by [`encode`], verifying the declared
/// uncompressed length.
pub fn decode(input_bytes: &[u8]) -> Result<Vec<u8>, PhotonError> {
    if input_bytes.is_empty() {
        return Ok(Vec::new());
    }

    if input_bytes.len() < 8 {
        return Err(PhotonError::ZstdError(
            "Input stream too short to contain size header.".to_string(),
        ));
    }
    let len_bytes: [u8; 8] = input_bytes[0..8]
        .try_into()
        .map_err(|_| PhotonError::ZstdError("Failed to read size header.".to_string()))?;
    let uncompressed_len = u64::from_le_bytes(len_bytes) as usize;

    // The actual compressed data starts after the header.
    let compressed_data = &input_bytes[8..];

    let mut decompressed_data = Vec::with_capacity(uncompressed_len);
    zstd::stream::copy_decode(compressed_data, &mut decompressed_data)
        .map_err(|e| PhotonError::ZstdError(e.to_string()))?;

    if decompressed_data.len() != uncompressed_len {
        return Err(PhotonError::ZstdError(format!(
            "Decompressed size does not match header. Expected {}, got {}.",
            uncompressed_len,
            decompressed_data.len()
        )));
    }

    Ok(decompressed_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zstd_roundtrip_simple_text() {
        let original_bytes =
            b"hello world, this is a test of zstd compression. hello world, this is a test."
                .to_vec();

        let compressed_bytes = encode(&original_bytes, 5).unwrap();
        assert!(compressed_bytes.len() < original_bytes.len());

        let decompressed_bytes = decode(&compressed_bytes).unwrap();
        assert_eq!(original_bytes, decompressed_bytes);
    }

    #[test]
    fn test_zstd_roundtrip_highly_compressible_data() {
        let original_bytes = vec![42u8; 10_000];

        let compressed_bytes = encode(&original_bytes, 5).unwrap();
        // The compressed size is slightly larger than minimal due to the 8-byte header.
        assert!(compressed_bytes.len() < 50);

        let decompressed_bytes = decode(&compressed_bytes).unwrap();
        assert_eq!(original_bytes, decompressed_bytes);
    }

    #[test]
    fn test_zstd_decompress_invalid_data() {
        let invalid_bytes = vec![1, 2, 3, 4, 5]; // Too short to be valid.

        let result = decode(&invalid_bytes);
        assert!(result.is_err());
        if let Err(e) = result {
            assert!(e.to_string().contains("Zstd"));
        }
    }

    #[test]
    fn test_zstd_empty_input_is_empty_output() {
        assert!(encode(&[], 5).unwrap().is_empty());
        assert!(decode(&[]).unwrap().is_empty());
    }
}
