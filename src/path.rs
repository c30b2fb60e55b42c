// In: src/path.rs

//! Deterministic schema-addressed path construction.
//!
//! A stored array is addressed by `(schema, table, ordered primary key, field)`
//! and lives at `{schema}/{table}/{k1=v1}/.../{field}.zarr`. The same address
//! always yields the same path, independent of process, time, or store
//! backend; the resolved string is persisted in the database row so decode
//! never needs the live primary-key values.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// The fixed suffix denoting the chunked array-store format.
pub const ARRAY_EXT: &str = ".zarr";

/// Characters escaped inside a path segment. `/` would split the segment,
/// `%` would collide with the escaping itself, `=` would make a `key=value`
/// segment ambiguous; the rest are unsafe in common object-store keys.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b'/')
    .add(b'%')
    .add(b'=')
    .add(b'\\')
    .add(b'#')
    .add(b'?')
    .add(b' ');

/// A primary-key value as supplied by the host at insert time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Int(i64),
    Str(String),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Int(v) => write!(f, "{}", v),
            KeyValue::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for KeyValue {
    fn from(v: i64) -> Self {
        KeyValue::Int(v)
    }
}

impl From<&str> for KeyValue {
    fn from(v: &str) -> Self {
        KeyValue::Str(v.to_string())
    }
}

/// The logical address of exactly one stored array, derived from the host's
/// record identity at encode time. Immutable once constructed; the primary key
/// preserves the host's declared key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalAddress {
    pub schema_name: String,
    pub table_name: String,
    pub primary_key: Vec<(String, KeyValue)>,
    pub field_name: String,
}

impl LogicalAddress {
    pub fn new(
        schema_name: impl Into<String>,
        table_name: impl Into<String>,
        primary_key: Vec<(String, KeyValue)>,
        field_name: impl Into<String>,
    ) -> Self {
        Self {
            schema_name: schema_name.into(),
            table_name: table_name.into(),
            primary_key,
            field_name: field_name.into(),
        }
    }
}

/// Builds the relative storage path for a logical address.
///
/// Segments are joined with `/`: schema, table, one `key=value` segment per
/// primary-key entry in declared order, then the field name with the array
/// extension. Key names and values are percent-encoded so an encoded segment
/// can never contain an unescaped `/`.
pub fn build_path(address: &LogicalAddress) -> String {
    let mut segments: Vec<String> = Vec::with_capacity(address.primary_key.len() + 3);
    segments.push(encode_segment(&address.schema_name));
    segments.push(encode_segment(&address.table_name));
    for (key, value) in &address.primary_key {
        segments.push(format!(
            "{}={}",
            encode_segment(key),
            encode_segment(&value.to_string())
        ));
    }
    segments.push(format!("{}{}", encode_segment(&address.field_name), ARRAY_EXT));
    segments.join("/")
}

fn encode_segment(raw: &str) -> String {
    utf8_percent_encode(raw, SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> LogicalAddress {
        LogicalAddress::new(
            "s",
            "t",
            vec![("recording_id".to_string(), KeyValue::Int(1))],
            "movie",
        )
    }

    #[test]
    fn test_expected_layout_for_simple_key() {
        assert_eq!(build_path(&address()), "s/t/recording_id=1/movie.zarr");
    }

    #[test]
    fn test_compound_key_preserves_declared_order() {
        let addr = LogicalAddress::new(
            "imaging",
            "scan",
            vec![
                ("session".to_string(), KeyValue::Int(3)),
                ("scan_idx".to_string(), KeyValue::Int(7)),
            ],
            "frames",
        );
        assert_eq!(
            build_path(&addr),
            "imaging/scan/session=3/scan_idx=7/frames.zarr"
        );
    }

    #[test]
    fn test_path_is_deterministic() {
        assert_eq!(build_path(&address()), build_path(&address()));
    }

    #[test]
    fn test_distinct_addresses_produce_distinct_paths() {
        let mut other = address();
        other.field_name = "movie2".to_string();
        assert_ne!(build_path(&address()), build_path(&other));

        let mut other_key = address();
        other_key.primary_key = vec![("recording_id".to_string(), KeyValue::Int(2))];
        assert_ne!(build_path(&address()), build_path(&other_key));
    }

    #[test]
    fn test_equals_sign_in_key_or_value_cannot_collide() {
        // Without escaping `=`, these two addresses would both render the
        // segment `a=1=2` and alias each other's storage.
        let first = LogicalAddress::new(
            "s",
            "t",
            vec![("a".to_string(), KeyValue::Str("1=2".to_string()))],
            "movie",
        );
        let second = LogicalAddress::new(
            "s",
            "t",
            vec![("a=1".to_string(), KeyValue::Str("2".to_string()))],
            "movie",
        );
        assert_eq!(build_path(&first), "s/t/a=1%3D2/movie.zarr");
        assert_eq!(build_path(&second), "s/t/a%3D1=2/movie.zarr");
        assert_ne!(build_path(&first), build_path(&second));
    }

    #[test]
    fn test_unsafe_characters_are_percent_encoded() {
        let addr = LogicalAddress::new(
            "s",
            "t",
            vec![(
                "session_path".to_string(),
                KeyValue::Str("a/b 100%".to_string()),
            )],
            "movie",
        );
        let path = build_path(&addr);
        assert_eq!(path, "s/t/session_path=a%2Fb%20100%25/movie.zarr");
        // The encoded segment must never re-introduce an unescaped separator.
        assert_eq!(path.matches('/').count(), 3);
    }
}
