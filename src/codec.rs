// In: src/codec.rs

//! The photon codec core: `validate`, `encode`, `decode`.
//!
//! Encode path: validate -> forward Anscombe transform -> schema-addressed
//! path -> chunked, compressed write -> transform attributes -> database
//! metadata mapping returned to the host. Decode path: lazy open -> version
//! gate -> lazy array handle, still in the stabilized domain (the inverse
//! transform is deliberately left to the caller; motion correction and
//! friends are meant to run on stabilized data).
//!
//! The codec is stateless apart from its fixed configuration and performs no
//! locking: concurrent encode/decode of the same path is the host's problem
//! to serialize, and chunk writes plus the attribute write are not atomic as
//! a group.

use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::CodecConfig;
use crate::error::PhotonError;
use crate::path::{build_path, LogicalAddress};
use crate::store::{open_array, write_array, write_attrs, ObjectStore, ZarrArray};
use crate::transform;
use crate::types::{CountArray, ElementType};
use crate::validate::validate;

/// The codec's registered name.
pub const CODEC_NAME: &str = "photon";
/// The data format version written by this codec.
pub const CODEC_VERSION: &str = "1.0";
/// The major version this codec can read. All minor versions within it are
/// accepted (attribute changes within a major are additive-only).
pub const SUPPORTED_MAJOR: u32 = 1;
/// The fixed transform identifier recorded in the database metadata.
pub const TRANSFORM_NAME: &str = "anscombe";

//==================================================================================
// 1. Versioning
//==================================================================================

/// A parsed `"<major>.<minor>"` codec version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecVersion {
    pub major: u32,
    pub minor: u32,
}

impl CodecVersion {
    /// Parses a version string. Anything that is not exactly two non-negative
    /// integers joined by `.` is rejected: silently treating garbage as some
    /// known version would mask corruption.
    pub fn parse(s: &str) -> Result<Self, PhotonError> {
        let malformed = || PhotonError::MalformedVersion(s.to_string());
        let (major, minor) = s.split_once('.').ok_or_else(malformed)?;
        Ok(Self {
            major: major.parse().map_err(|_| malformed())?,
            minor: minor.parse().map_err(|_| malformed())?,
        })
    }

    /// Within a major version every minor is readable; crossing a major is a
    /// hard incompatibility with no migration path in this component.
    pub fn is_compatible_with(&self, major: u32) -> bool {
        self.major == major
    }
}

//==================================================================================
// 2. Persisted Records
//==================================================================================

/// The metadata mapping persisted in the host's database row. This is the only
/// link between a row and the external bytes, so the JSON key names are a
/// bit-exact contract: `path`, `store`, `codec_version`, `shape`, `dtype`,
/// `transform`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoredArrayMetadata {
    /// Relative storage path, unique per logical address and stable for the
    /// lifetime of the row. Mutating the row's primary key orphans the old
    /// path; reclamation is an external sweep, not this codec's job.
    pub path: String,
    /// Store name; absent means the host's default store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    #[serde(default = "default_codec_version")]
    pub codec_version: String,
    /// Original, pre-transform shape (the transform does not change shape).
    pub shape: Vec<usize>,
    /// Post-transform element type (always floating-point).
    pub dtype: String,
    pub transform: String,
}

fn default_codec_version() -> String {
    "1.0".to_string()
}

/// The attributes written alongside the array, read back at every decode.
/// Gain/offset/variance fully determine the forward/inverse mapping; decode
/// must take them from storage, never from the codec's current defaults.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransformAttributes {
    pub codec_version: String,
    pub codec_name: String,
    pub anscombe_gain: f64,
    pub anscombe_offset: f64,
    pub anscombe_variance: f64,
    pub original_dtype: String,
}

impl TransformAttributes {
    /// Parses the attributes document of an opened array.
    pub fn from_attrs(attrs: &serde_json::Map<String, Value>) -> Result<Self, PhotonError> {
        Ok(serde_json::from_value(Value::Object(attrs.clone()))?)
    }

    /// The transform parameters as stored.
    pub fn anscombe_params(&self) -> transform::AnscombeParams {
        transform::AnscombeParams {
            gain: self.anscombe_gain,
            offset: self.anscombe_offset,
            variance: self.anscombe_variance,
        }
    }

    /// The element type the counts had before stabilization, parsed from the
    /// stored `original_dtype` name. An unrecognized name is a hard error so a
    /// caller casting restored counts back cannot pick a wrong width silently.
    pub fn original_element_type(&self) -> Result<ElementType, PhotonError> {
        ElementType::parse(&self.original_dtype)
    }
}

//==================================================================================
// 3. The Host-Facing Codec Contract
//==================================================================================

/// The three-method capability contract a host registry looks up by name.
///
/// Object-safe on purpose: the host resolves store names to backends and hands
/// the codec a ready `Arc<dyn ObjectStore>` plus the name as an opaque label.
pub trait SchemaCodec: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fail-fast input validation; no side effects, no I/O.
    fn validate(&self, value: &CountArray) -> Result<(), PhotonError>;

    /// Transforms and writes `value`, returning the metadata mapping the host
    /// persists verbatim in its row storage.
    fn encode(
        &self,
        value: &CountArray,
        address: &LogicalAddress,
        store: Arc<dyn ObjectStore>,
        store_name: Option<&str>,
    ) -> Result<StoredArrayMetadata, PhotonError>;

    /// Opens the stored array lazily and returns the handle, still in the
    /// transformed domain. `key` is accepted for contract symmetry with
    /// `encode` but is not needed: the resolved path travels in `stored`.
    fn decode(
        &self,
        stored: &StoredArrayMetadata,
        store: Arc<dyn ObjectStore>,
        key: Option<&LogicalAddress>,
    ) -> Result<ZarrArray, PhotonError>;
}

//==================================================================================
// 4. PhotonCodec
//==================================================================================

/// The codec for photon-limited movies with Anscombe variance stabilization.
#[derive(Debug, Clone, Default)]
pub struct PhotonCodec {
    config: CodecConfig,
}

impl PhotonCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Resolves the version an opened array should be interpreted as:
    /// the array's own attribute wins over the database-side value, since the
    /// array is the durable source of truth. A missing attribute falls back to
    /// the row metadata (itself defaulting to `"1.0"`), with a warning,
    /// because partially written arrays may lack attributes entirely.
    fn effective_version(array: &ZarrArray, stored: &StoredArrayMetadata) -> Result<String, PhotonError> {
        match array.attrs().get("codec_version") {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(PhotonError::MalformedVersion(other.to_string())),
            None => {
                warn!(
                    "array at '{}' has no codec_version attribute; assuming version {}",
                    array.path(),
                    stored.codec_version
                );
                Ok(stored.codec_version.clone())
            }
        }
    }
}

impl SchemaCodec for PhotonCodec {
    fn name(&self) -> &'static str {
        CODEC_NAME
    }

    fn validate(&self, value: &CountArray) -> Result<(), PhotonError> {
        validate(value)
    }

    fn encode(
        &self,
        value: &CountArray,
        address: &LogicalAddress,
        store: Arc<dyn ObjectStore>,
        store_name: Option<&str>,
    ) -> Result<StoredArrayMetadata, PhotonError> {
        // Reject before the transform engine ever sees the data: the forward
        // transform is undefined for negative inputs. No writes on failure.
        validate(value)?;

        let original_dtype = value.element_type();
        let transformed = transform::forward(value, &self.config.anscombe);

        let path = build_path(address);
        let shape = transformed.shape().to_vec();
        let mut chunk_shape = shape.clone();
        // min(configured frames, n); clamped so a zero-length time axis still
        // produces well-formed metadata (with no chunk objects at all).
        chunk_shape[0] = self.config.chunk_frames.min(shape[0]).max(1);

        debug!(
            "encoding {} array of shape {:?} to '{}' with chunk shape {:?}",
            original_dtype, shape, path, chunk_shape
        );
        write_array(
            store.as_ref(),
            &path,
            &transformed,
            &chunk_shape,
            &self.config.compressor,
        )?;

        let attrs = TransformAttributes {
            codec_version: CODEC_VERSION.to_string(),
            codec_name: CODEC_NAME.to_string(),
            anscombe_gain: self.config.anscombe.gain,
            anscombe_offset: self.config.anscombe.offset,
            anscombe_variance: self.config.anscombe.variance,
            original_dtype: original_dtype.to_string(),
        };
        write_attrs(store.as_ref(), &path, &attrs)?;

        Ok(StoredArrayMetadata {
            path,
            store: store_name.map(str::to_string),
            codec_version: CODEC_VERSION.to_string(),
            shape,
            dtype: ElementType::Float64.to_string(),
            transform: TRANSFORM_NAME.to_string(),
        })
    }

    fn decode(
        &self,
        stored: &StoredArrayMetadata,
        store: Arc<dyn ObjectStore>,
        _key: Option<&LogicalAddress>,
    ) -> Result<ZarrArray, PhotonError> {
        // Lazy open: only the metadata documents are read here.
        let array = open_array(store, &stored.path)?;

        let version_str = Self::effective_version(&array, stored)?;
        let version = CodecVersion::parse(&version_str)?;
        if !version.is_compatible_with(SUPPORTED_MAJOR) {
            return Err(PhotonError::IncompatibleVersion {
                found: version_str,
                supported_major: SUPPORTED_MAJOR,
            });
        }

        debug!(
            "decoded '{}' (version {}, shape {:?})",
            array.path(),
            version_str,
            array.shape()
        );
        Ok(array)
    }
}

//==================================================================================
// 5. Unit & Scenario Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::KeyValue;
    use crate::store::DirectoryStore;
    use crate::transform::AnscombeParams;
    use ndarray::{ArrayD, IxDyn};
    use rand::Rng;

    fn test_store() -> (tempfile::TempDir, Arc<dyn ObjectStore>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn ObjectStore> = Arc::new(DirectoryStore::new(dir.path()));
        (dir, store)
    }

    fn movie_address() -> LogicalAddress {
        LogicalAddress::new(
            "s",
            "t",
            vec![("recording_id".to_string(), KeyValue::Int(1))],
            "movie",
        )
    }

    /// Simulated low-count Poisson data: small non-negative integers.
    fn poisson_like_movie(frames: usize, h: usize, w: usize) -> ArrayD<u16> {
        let mut rng = rand::rng();
        let values: Vec<u16> = (0..frames * h * w).map(|_| rng.random_range(0..25)).collect();
        ArrayD::from_shape_vec(IxDyn(&[frames, h, w]), values).unwrap()
    }

    #[test]
    fn test_end_to_end_scenario() {
        let (_dir, store) = test_store();
        let codec = PhotonCodec::default();
        let movie = poisson_like_movie(200, 16, 16);
        let original = CountArray::from(movie.clone());

        let stored = codec
            .encode(&original, &movie_address(), store.clone(), None)
            .unwrap();

        assert_eq!(stored.path, "s/t/recording_id=1/movie.zarr");
        assert_eq!(stored.shape, vec![200, 16, 16]);
        assert_eq!(stored.codec_version, "1.0");
        assert_eq!(stored.dtype, "float64");
        assert_eq!(stored.transform, "anscombe");
        assert_eq!(stored.store, None);

        let handle = codec.decode(&stored, store, None).unwrap();
        assert_eq!(handle.shape(), &[200, 16, 16]);

        // The handle holds stabilized data; recover counts with the stored
        // parameters, never the codec defaults.
        let attrs = TransformAttributes::from_attrs(handle.attrs()).unwrap();
        assert_eq!(attrs.codec_name, "photon");
        assert_eq!(attrs.original_element_type().unwrap(), ElementType::UInt16);
        let restored = transform::inverse(&handle.read_all().unwrap(), &attrs.anscombe_params());
        for (r, o) in restored.iter().zip(movie.iter()) {
            let expected = *o as f64;
            assert!(
                (r - expected).abs() <= 1e-10 * expected.abs().max(1.0),
                "restored {} != original {}",
                r,
                expected
            );
        }
    }

    #[test]
    fn test_chunk_shape_invariant() {
        let (_dir, store) = test_store();
        let codec = PhotonCodec::default();

        let stored = codec
            .encode(
                &CountArray::from(poisson_like_movie(200, 16, 16)),
                &movie_address(),
                store.clone(),
                None,
            )
            .unwrap();
        let handle = codec.decode(&stored, store.clone(), None).unwrap();
        assert_eq!(handle.chunk_shape(), &[100, 16, 16]);
        assert_eq!(handle.num_chunks(), 2);
        assert!(store.contains("s/t/recording_id=1/movie.zarr/1.0.0").unwrap());

        // Shorter than one chunk: the whole time axis becomes the chunk extent.
        let short_addr = LogicalAddress::new(
            "s",
            "t",
            vec![("recording_id".to_string(), KeyValue::Int(2))],
            "movie",
        );
        let stored = codec
            .encode(
                &CountArray::from(poisson_like_movie(50, 8, 8)),
                &short_addr,
                store.clone(),
                None,
            )
            .unwrap();
        let handle = codec.decode(&stored, store, None).unwrap();
        assert_eq!(handle.chunk_shape(), &[50, 8, 8]);
        assert_eq!(handle.num_chunks(), 1);
    }

    #[test]
    fn test_negative_value_rejection_writes_nothing() {
        let (_dir, store) = test_store();
        let codec = PhotonCodec::default();

        let mut movie = ArrayD::<i32>::from_elem(IxDyn(&[10, 4, 4]), 3);
        movie[IxDyn(&[5, 2, 1])] = -1;

        let result = codec.encode(
            &CountArray::from(movie),
            &movie_address(),
            store.clone(),
            None,
        );
        assert!(matches!(result, Err(PhotonError::NegativeValues)));
        // Fail-fast means no path was ever created in the store.
        assert!(!store.contains("s/t/recording_id=1/movie.zarr/.zarray").unwrap());
    }

    #[test]
    fn test_low_rank_rejection_names_the_requirement() {
        let (_dir, store) = test_store();
        let codec = PhotonCodec::default();

        let image = ArrayD::<u16>::zeros(IxDyn(&[16, 16]));
        let err = codec
            .encode(&CountArray::from(image), &movie_address(), store, None)
            .unwrap_err();
        assert!(matches!(err, PhotonError::RankTooLow(2)));
        assert!(err.to_string().contains("3-dimensional"));
    }

    #[test]
    fn test_metadata_shape_fidelity_across_dtype_change() {
        let (_dir, store) = test_store();
        let codec = PhotonCodec::default();

        let movie = poisson_like_movie(7, 5, 3);
        let stored = codec
            .encode(&CountArray::from(movie), &movie_address(), store, None)
            .unwrap();
        // Shape is the original, pre-transform shape; dtype is post-transform.
        assert_eq!(stored.shape, vec![7, 5, 3]);
        assert_eq!(stored.dtype, "float64");
    }

    fn rewrite_version_attr(store: &Arc<dyn ObjectStore>, path: &str, version: Value) {
        let key = format!("{}/.zattrs", path);
        let mut attrs: serde_json::Map<String, Value> =
            serde_json::from_slice(&store.get(&key).unwrap()).unwrap();
        attrs.insert("codec_version".to_string(), version);
        store.put(&key, &serde_json::to_vec(&attrs).unwrap()).unwrap();
    }

    #[test]
    fn test_version_gate_accepts_same_major() {
        let (_dir, store) = test_store();
        let codec = PhotonCodec::default();
        let stored = codec
            .encode(
                &CountArray::from(poisson_like_movie(5, 4, 4)),
                &movie_address(),
                store.clone(),
                None,
            )
            .unwrap();

        rewrite_version_attr(&store, &stored.path, Value::from("1.7"));
        assert!(codec.decode(&stored, store, None).is_ok());
    }

    #[test]
    fn test_version_gate_rejects_other_major() {
        let (_dir, store) = test_store();
        let codec = PhotonCodec::default();
        let stored = codec
            .encode(
                &CountArray::from(poisson_like_movie(5, 4, 4)),
                &movie_address(),
                store.clone(),
                None,
            )
            .unwrap();

        rewrite_version_attr(&store, &stored.path, Value::from("2.0"));
        let err = codec.decode(&stored, store, None).unwrap_err();
        assert!(matches!(
            err,
            PhotonError::IncompatibleVersion { ref found, supported_major: 1 } if found == "2.0"
        ));
    }

    #[test]
    fn test_version_attribute_wins_over_row_metadata() {
        let (_dir, store) = test_store();
        let codec = PhotonCodec::default();
        let mut stored = codec
            .encode(
                &CountArray::from(poisson_like_movie(5, 4, 4)),
                &movie_address(),
                store.clone(),
                None,
            )
            .unwrap();

        // The row claims an incompatible version, but the array itself is the
        // durable source of truth and says 1.0.
        stored.codec_version = "2.0".to_string();
        assert!(codec.decode(&stored, store, None).is_ok());
    }

    #[test]
    fn test_missing_attributes_fall_back_to_row_version() {
        let (dir, store) = test_store();
        let codec = PhotonCodec::default();
        let stored = codec
            .encode(
                &CountArray::from(poisson_like_movie(5, 4, 4)),
                &movie_address(),
                store.clone(),
                None,
            )
            .unwrap();

        // Simulate a partial write that never landed the attributes document.
        let attrs_file = DirectoryStore::new(dir.path())
            .root()
            .join(&stored.path)
            .join(".zattrs");
        std::fs::remove_file(attrs_file).unwrap();

        let handle = codec.decode(&stored, store, None).unwrap();
        assert!(handle.attrs().is_empty());
    }

    #[test]
    fn test_unparseable_version_is_rejected_not_defaulted() {
        let (_dir, store) = test_store();
        let codec = PhotonCodec::default();
        let stored = codec
            .encode(
                &CountArray::from(poisson_like_movie(5, 4, 4)),
                &movie_address(),
                store.clone(),
                None,
            )
            .unwrap();

        rewrite_version_attr(&store, &stored.path, Value::from("garbage"));
        assert!(matches!(
            codec.decode(&stored, store.clone(), None),
            Err(PhotonError::MalformedVersion(_))
        ));

        rewrite_version_attr(&store, &stored.path, Value::from(2));
        assert!(matches!(
            codec.decode(&stored, store, None),
            Err(PhotonError::MalformedVersion(_))
        ));
    }

    #[test]
    fn test_reencode_same_path_replaces_content() {
        let (_dir, store) = test_store();
        let codec = PhotonCodec::default();
        let address = movie_address();

        let first = ArrayD::<u16>::from_elem(IxDyn(&[4, 2, 2]), 1);
        let second = ArrayD::<u16>::from_elem(IxDyn(&[4, 2, 2]), 9);
        codec
            .encode(&CountArray::from(first), &address, store.clone(), None)
            .unwrap();
        let stored = codec
            .encode(&CountArray::from(second.clone()), &address, store.clone(), None)
            .unwrap();

        let handle = codec.decode(&stored, store, None).unwrap();
        let restored = transform::inverse(
            &handle.read_all().unwrap(),
            &AnscombeParams::default(),
        );
        for v in restored.iter() {
            assert!((v - 9.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_store_name_is_carried_verbatim() {
        let (_dir, store) = test_store();
        let codec = PhotonCodec::default();
        let stored = codec
            .encode(
                &CountArray::from(poisson_like_movie(3, 4, 4)),
                &movie_address(),
                store,
                Some("cold-storage"),
            )
            .unwrap();
        assert_eq!(stored.store.as_deref(), Some("cold-storage"));
    }

    #[test]
    fn test_metadata_mapping_keys_are_bit_exact() {
        let stored = StoredArrayMetadata {
            path: "s/t/recording_id=1/movie.zarr".to_string(),
            store: None,
            codec_version: "1.0".to_string(),
            shape: vec![200, 16, 16],
            dtype: "float64".to_string(),
            transform: "anscombe".to_string(),
        };
        // `store` is absent when None, meaning the default store.
        let json = serde_json::to_string(&stored).unwrap();
        assert_eq!(
            json,
            r#"{"path":"s/t/recording_id=1/movie.zarr","codec_version":"1.0","shape":[200,16,16],"dtype":"float64","transform":"anscombe"}"#
        );

        // A mapping without codec_version decodes as the oldest known version.
        let legacy: StoredArrayMetadata = serde_json::from_str(
            r#"{"path": "p.zarr", "shape": [1, 1, 1], "dtype": "float64", "transform": "anscombe"}"#,
        )
        .unwrap();
        assert_eq!(legacy.codec_version, "1.0");
    }

    #[test]
    fn test_unknown_original_dtype_name_is_rejected() {
        let attrs = TransformAttributes {
            codec_version: "1.0".to_string(),
            codec_name: "photon".to_string(),
            anscombe_gain: 1.0,
            anscombe_offset: 0.0,
            anscombe_variance: 0.0,
            original_dtype: "object".to_string(),
        };
        assert!(matches!(
            attrs.original_element_type(),
            Err(PhotonError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_codec_version_parsing() {
        let v = CodecVersion::parse("1.7").unwrap();
        assert_eq!((v.major, v.minor), (1, 7));
        assert!(v.is_compatible_with(1));
        assert!(!v.is_compatible_with(2));

        // The constant this codec writes must agree with the gate it reads by.
        assert_eq!(CodecVersion::parse(CODEC_VERSION).unwrap().major, SUPPORTED_MAJOR);

        for bad in ["", "1", "1.", ".0", "a.b", "1.0.0", "-1.0"] {
            assert!(
                matches!(CodecVersion::parse(bad), Err(PhotonError::MalformedVersion(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }
}
