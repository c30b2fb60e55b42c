//! This module contains the pure, stateless kernel for byte-shuffling streams
//! of fixed-width elements.
//!
//! Shuffling reorganizes a row-oriented byte stream into a byte-plane layout:
//! all 0th bytes first, then all 1st bytes, and so on. Grouping bytes of equal
//! significance makes the stream far more compressible for the entropy coder
//! that follows. This module is pure Rust, panic-free, and contains no `unsafe`
//! code blocks.

use crate::error::PhotonError;

/// Transposes `input` into byte-plane order, given the element width in bytes.
///
/// The output has exactly the same length as the input; shuffling is a pure
/// permutation. A one-byte element width is a no-op copy.
pub fn encode(input: &[u8], element_size: usize, output_buf: &mut Vec<u8>) -> Result<(), PhotonError> {
    if element_size == 0 {
        return Err(PhotonError::InternalError(
            "Shuffle element size must be non-zero".into(),
        ));
    }
    if input.len() % element_size != 0 {
        return Err(PhotonError::BufferMismatch(element_size, input.len()));
    }

    output_buf.clear();
    if element_size == 1 {
        output_buf.extend_from_slice(input);
        return Ok(());
    }

    let num_elements = input.len() / element_size;
    output_buf.resize(input.len(), 0);

    for i in 0..element_size {
        for j in 0..num_elements {
            output_buf[i * num_elements + j] = input[j * element_size + i];
        }
    }

    Ok(())
}

/// Restores the original byte layout from a byte-plane stream.
///
/// This is the exact inverse of [`encode`].
pub fn decode(input: &[u8], element_size: usize, output_buf: &mut Vec<u8>) -> Result<(), PhotonError> {
    if element_size == 0 {
        return Err(PhotonError::InternalError(
            "Shuffle element size must be non-zero".into(),
        ));
    }
    if input.len() % element_size != 0 {
        return Err(PhotonError::BufferMismatch(element_size, input.len()));
    }

    output_buf.clear();
    if element_size == 1 {
        output_buf.extend_from_slice(input);
        return Ok(());
    }

    let num_elements = input.len() / element_size;
    output_buf.resize(input.len(), 0);

    for i in 0..element_size {
        for j in 0..num_elements {
            output_buf[j * element_size + i] = input[i * num_elements + j];
        }
    }

    Ok(())
}
