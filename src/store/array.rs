// In: src/store/array.rs

//! The chunked-array format on top of an [`ObjectStore`].
//!
//! An array at `{path}` consists of three kinds of objects:
//!
//! ```text
//! {path}/.zarray        array metadata: shape, chunk shape, dtype, compressor, fill value
//! {path}/.zattrs        array attributes (transform parameters, codec version)
//! {path}/0.0.0, 1.0.0   chunk objects, one per chunk-grid index, dot-joined
//! ```
//!
//! Chunks are partitioned along the leading (time) axis only; every chunk
//! spans the full extent of the remaining axes. The trailing chunk is padded
//! to the full chunk shape with the fill value on disk and truncated on read.
//! Each chunk is compressed independently (byte shuffle, then zstd), which is
//! what makes partial reads proportional to the portion of the array touched.

use std::ops::Range;
use std::sync::Arc;

use log::debug;
use ndarray::{concatenate, ArrayD, ArrayViewD, Axis, IxDyn, Slice};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PhotonError;
use crate::kernels::{shuffle, zstd};
use crate::store::ObjectStore;
use crate::types::ElementType;

/// Key of the array-metadata document, relative to the array path.
pub const ARRAY_META_KEY: &str = ".zarray";
/// Key of the array-attributes document, relative to the array path.
pub const ARRAY_ATTRS_KEY: &str = ".zattrs";
/// The array-metadata format generation written into every document.
pub const ARRAY_FORMAT: u8 = 2;

//==================================================================================
// 1. On-Disk Documents
//==================================================================================

/// The named compressor specification recorded in the array metadata.
///
/// The codec always writes the fixed default (byte shuffle + zstd at a
/// moderate level); the reader honors whatever the document declares.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CompressorSpec {
    pub id: String,
    pub clevel: i32,
    /// 1 enables the byte-shuffle filter, 0 disables it.
    pub shuffle: u8,
}

impl Default for CompressorSpec {
    fn default() -> Self {
        Self {
            id: "zstd".to_string(),
            clevel: 5,
            shuffle: 1,
        }
    }
}

/// The array-metadata document. This is the bit-exact contract other tools may
/// rely on, so field names and value forms are fixed.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ArrayMeta {
    pub zarr_format: u8,
    pub shape: Vec<usize>,
    pub chunks: Vec<usize>,
    /// Little-endian dtype code, e.g. `"<f8"`.
    pub dtype: String,
    pub compressor: CompressorSpec,
    pub fill_value: f64,
    pub order: String,
    pub filters: Option<Vec<String>>,
}

fn meta_key(path: &str) -> String {
    format!("{}/{}", path, ARRAY_META_KEY)
}

fn attrs_key(path: &str) -> String {
    format!("{}/{}", path, ARRAY_ATTRS_KEY)
}

/// Dot-joins a chunk-grid index into its object key, e.g. `[1, 0, 0]` ->
/// `"{path}/1.0.0"`.
fn chunk_key(path: &str, grid_index: &[usize]) -> String {
    let joined = grid_index
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(".");
    format!("{}/{}", path, joined)
}

//==================================================================================
// 2. Writing
//==================================================================================

/// Writes `data` under `path` as a chunked, compressed array.
///
/// `chunk_shape` must partition along axis 0 only: its extent on every other
/// axis must equal the array's. Chunk writes are not atomic as a group; a
/// failure partway through can leave a partially written array (the caller's
/// recovery is to re-encode the same path).
pub fn write_array<S: ObjectStore + ?Sized>(
    store: &S,
    path: &str,
    data: &ArrayD<f64>,
    chunk_shape: &[usize],
    compressor: &CompressorSpec,
) -> Result<ArrayMeta, PhotonError> {
    let shape = data.shape();
    if chunk_shape.len() != shape.len() || chunk_shape[1..] != shape[1..] {
        return Err(PhotonError::InternalError(format!(
            "Chunk shape {:?} must span the full extent of all non-time axes of {:?}",
            chunk_shape, shape
        )));
    }
    let chunk_len = chunk_shape[0];
    if chunk_len == 0 {
        return Err(PhotonError::InternalError(
            "Chunk extent along the time axis must be non-zero".into(),
        ));
    }

    let meta = ArrayMeta {
        zarr_format: ARRAY_FORMAT,
        shape: shape.to_vec(),
        chunks: chunk_shape.to_vec(),
        dtype: ElementType::Float64.type_code().to_string(),
        compressor: compressor.clone(),
        fill_value: 0.0,
        order: "C".to_string(),
        filters: None,
    };
    store.put(&meta_key(path), &serde_json::to_vec(&meta)?)?;

    let n = shape[0];
    let num_chunks = n.div_ceil(chunk_len);
    for i in 0..num_chunks {
        let start = i * chunk_len;
        let end = (start + chunk_len).min(n);
        let view = data.slice_axis(Axis(0), Slice::from(start..end));

        // The trailing chunk is padded to the full chunk shape with the fill value.
        let chunk = if end - start == chunk_len {
            view.to_owned()
        } else {
            let mut padded = ArrayD::from_elem(IxDyn(chunk_shape), meta.fill_value);
            padded
                .slice_axis_mut(Axis(0), Slice::from(0..end - start))
                .assign(&view);
            padded
        };

        let mut grid_index = vec![0usize; shape.len()];
        grid_index[0] = i;
        let encoded = encode_chunk(&chunk, compressor)?;
        debug!(
            "wrote chunk {} of {} ({} bytes compressed)",
            i + 1,
            num_chunks,
            encoded.len()
        );
        store.put(&chunk_key(path, &grid_index), &encoded)?;
    }

    Ok(meta)
}

/// Writes the array-attributes document under `path`.
pub fn write_attrs<S, A>(store: &S, path: &str, attrs: &A) -> Result<(), PhotonError>
where
    S: ObjectStore + ?Sized,
    A: Serialize,
{
    store.put(&attrs_key(path), &serde_json::to_vec(attrs)?)
}

fn encode_chunk(chunk: &ArrayD<f64>, compressor: &CompressorSpec) -> Result<Vec<u8>, PhotonError> {
    if compressor.id != "zstd" {
        return Err(PhotonError::UnsupportedType(format!(
            "compressor '{}'",
            compressor.id
        )));
    }
    let values = chunk.as_slice().ok_or_else(|| {
        PhotonError::InternalError("Chunk buffer is not contiguous".to_string())
    })?;
    let raw: &[u8] = bytemuck::cast_slice(values);

    if compressor.shuffle == 1 {
        let mut shuffled = Vec::new();
        shuffle::encode(raw, ElementType::Float64.size_of(), &mut shuffled)?;
        zstd::encode(&shuffled, compressor.clevel)
    } else {
        zstd::encode(raw, compressor.clevel)
    }
}

fn decode_chunk(
    bytes: &[u8],
    chunk_shape: &[usize],
    compressor: &CompressorSpec,
) -> Result<ArrayD<f64>, PhotonError> {
    if compressor.id != "zstd" {
        return Err(PhotonError::UnsupportedType(format!(
            "compressor '{}'",
            compressor.id
        )));
    }
    let decompressed = zstd::decode(bytes)?;
    let raw = if compressor.shuffle == 1 {
        let mut unshuffled = Vec::new();
        shuffle::decode(&decompressed, ElementType::Float64.size_of(), &mut unshuffled)?;
        unshuffled
    } else {
        decompressed
    };

    // pod_collect_to_vec tolerates the arbitrary alignment of a fresh Vec<u8>.
    let values: Vec<f64> = bytemuck::pod_collect_to_vec(&raw);
    ArrayD::from_shape_vec(IxDyn(chunk_shape), values).map_err(|e| {
        PhotonError::InternalError(format!("Chunk payload does not match chunk shape: {}", e))
    })
}

//==================================================================================
// 3. Lazy Reading
//==================================================================================

/// Opens the array at `path` read-only.
///
/// This reads only the two metadata documents; no chunk is fetched or
/// decompressed until its elements are actually requested. The declared dtype
/// code is validated eagerly: the chunk decoder only handles the stabilized
/// `"<f8"` representation, so any other code is an `UnsupportedType` error at
/// open time rather than a garbled read later. A missing attributes document
/// yields an empty attribute map (the version policy for that case lives in
/// the codec, not here).
pub fn open_array(store: Arc<dyn ObjectStore>, path: &str) -> Result<ZarrArray, PhotonError> {
    let meta: ArrayMeta = serde_json::from_slice(&store.get(&meta_key(path))?)?;
    if ElementType::from_type_code(&meta.dtype)? != ElementType::Float64 {
        return Err(PhotonError::UnsupportedType(format!(
            "stored dtype '{}' (expected '{}')",
            meta.dtype,
            ElementType::Float64.type_code()
        )));
    }
    let attrs: Map<String, Value> = match store.get(&attrs_key(path)) {
        Ok(bytes) => serde_json::from_slice(&bytes)?,
        Err(PhotonError::NotFound(_)) => Map::new(),
        Err(e) => return Err(e),
    };
    Ok(ZarrArray {
        store,
        path: path.to_string(),
        meta,
        attrs,
    })
}

/// A lazy, read-only handle to a stored chunked array.
///
/// Holds the parsed metadata and a store reference; element access goes
/// through [`read_chunk`](ZarrArray::read_chunk),
/// [`read_frames`](ZarrArray::read_frames) or
/// [`read_all`](ZarrArray::read_all), each of which fetches and decompresses
/// only the chunks it needs.
pub struct ZarrArray {
    store: Arc<dyn ObjectStore>,
    path: String,
    meta: ArrayMeta,
    attrs: Map<String, Value>,
}

// Manual impl: the store handle is a trait object and has no Debug of its own.
impl std::fmt::Debug for ZarrArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZarrArray")
            .field("path", &self.path)
            .field("shape", &self.meta.shape)
            .field("chunks", &self.meta.chunks)
            .field("dtype", &self.meta.dtype)
            .finish()
    }
}

impl ZarrArray {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn shape(&self) -> &[usize] {
        &self.meta.shape
    }

    pub fn chunk_shape(&self) -> &[usize] {
        &self.meta.chunks
    }

    pub fn dtype(&self) -> &str {
        &self.meta.dtype
    }

    pub fn meta(&self) -> &ArrayMeta {
        &self.meta
    }

    /// The array-attributes document as parsed JSON.
    pub fn attrs(&self) -> &Map<String, Value> {
        &self.attrs
    }

    /// Number of chunks along the time axis.
    pub fn num_chunks(&self) -> usize {
        let n = self.meta.shape[0];
        let chunk_len = self.meta.chunks[0];
        if chunk_len == 0 {
            0
        } else {
            n.div_ceil(chunk_len)
        }
    }

    /// Fetches and decompresses the `i`-th chunk, truncated to its actual
    /// extent (the trailing chunk is stored padded).
    pub fn read_chunk(&self, i: usize) -> Result<ArrayD<f64>, PhotonError> {
        let chunk_len = self.meta.chunks[0];
        let n = self.meta.shape[0];
        if i >= self.num_chunks() {
            return Err(PhotonError::InternalError(format!(
                "Chunk index {} out of range ({} chunks)",
                i,
                self.num_chunks()
            )));
        }

        let mut grid_index = vec![0usize; self.meta.shape.len()];
        grid_index[0] = i;
        let bytes = self.store.get(&chunk_key(&self.path, &grid_index))?;
        let full = decode_chunk(&bytes, &self.meta.chunks, &self.meta.compressor)?;

        let actual_len = chunk_len.min(n - i * chunk_len);
        if actual_len == chunk_len {
            Ok(full)
        } else {
            Ok(full
                .slice_axis(Axis(0), Slice::from(0..actual_len))
                .to_owned())
        }
    }

    /// Reads a contiguous range of frames along the time axis, touching only
    /// the chunks the range intersects.
    pub fn read_frames(&self, frames: Range<usize>) -> Result<ArrayD<f64>, PhotonError> {
        let n = self.meta.shape[0];
        let start = frames.start.min(n);
        let end = frames.end.min(n);
        if start >= end {
            let mut empty_shape = self.meta.shape.clone();
            empty_shape[0] = 0;
            return Ok(ArrayD::zeros(IxDyn(&empty_shape)));
        }

        let chunk_len = self.meta.chunks[0];
        if chunk_len == 0 {
            return Err(PhotonError::InternalError(
                "Array metadata declares a zero chunk extent".to_string(),
            ));
        }
        let first = start / chunk_len;
        let last = (end - 1) / chunk_len;

        let mut parts: Vec<ArrayD<f64>> = Vec::with_capacity(last - first + 1);
        for ci in first..=last {
            let chunk_start = ci * chunk_len;
            let chunk = self.read_chunk(ci)?;
            let local_start = start.max(chunk_start) - chunk_start;
            let local_end = end.min(chunk_start + chunk.shape()[0]) - chunk_start;
            parts.push(
                chunk
                    .slice_axis(Axis(0), Slice::from(local_start..local_end))
                    .to_owned(),
            );
        }

        if parts.len() == 1 {
            return Ok(parts.pop().ok_or_else(|| {
                PhotonError::InternalError("Frame read produced no parts".to_string())
            })?);
        }
        let views: Vec<ArrayViewD<f64>> = parts.iter().map(|p| p.view()).collect();
        concatenate(Axis(0), &views)
            .map_err(|e| PhotonError::InternalError(format!("Frame concatenation failed: {}", e)))
    }

    /// Reads the entire array content.
    pub fn read_all(&self) -> Result<ArrayD<f64>, PhotonError> {
        self.read_frames(0..self.meta.shape[0])
    }
}

//==================================================================================
// 4. Unit Tests
//==================================================================================
