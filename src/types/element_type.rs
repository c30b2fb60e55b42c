//! This module defines the canonical, type-safe representation of array element
//! types used throughout the photon codec.

use crate::error::PhotonError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The canonical, internal representation of an array element type.
///
/// This enum replaces free-form dtype strings, enabling compile-time checks and
/// eliminating an entire class of runtime errors. Every type here is numeric:
/// opaque/object element types are unrepresentable by construction.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl ElementType {
    /// Parses the canonical lowercase dtype name (e.g. `"uint16"`, `"float64"`)
    /// back into an `ElementType`.
    ///
    /// These names are part of the on-disk attribute contract, so unknown input
    /// is a hard `UnsupportedType` error rather than a silent fallback.
    pub fn parse(name: &str) -> Result<Self, PhotonError> {
        match name {
            "int8" => Ok(Self::Int8),
            "int16" => Ok(Self::Int16),
            "int32" => Ok(Self::Int32),
            "int64" => Ok(Self::Int64),
            "uint8" => Ok(Self::UInt8),
            "uint16" => Ok(Self::UInt16),
            "uint32" => Ok(Self::UInt32),
            "uint64" => Ok(Self::UInt64),
            "float32" => Ok(Self::Float32),
            "float64" => Ok(Self::Float64),
            other => Err(PhotonError::UnsupportedType(other.to_string())),
        }
    }

    /// Returns the little-endian dtype code written into the array metadata
    /// document (e.g. `"<f8"` for `Float64`).
    pub fn type_code(&self) -> &'static str {
        match self {
            Self::Int8 => "|i1",
            Self::Int16 => "<i2",
            Self::Int32 => "<i4",
            Self::Int64 => "<i8",
            Self::UInt8 => "|u1",
            Self::UInt16 => "<u2",
            Self::UInt32 => "<u4",
            Self::UInt64 => "<u8",
            Self::Float32 => "<f4",
            Self::Float64 => "<f8",
        }
    }

    /// Parses a little-endian dtype code (the array-metadata form) back into an
    /// `ElementType`.
    pub fn from_type_code(code: &str) -> Result<Self, PhotonError> {
        match code {
            "|i1" => Ok(Self::Int8),
            "<i2" => Ok(Self::Int16),
            "<i4" => Ok(Self::Int32),
            "<i8" => Ok(Self::Int64),
            "|u1" => Ok(Self::UInt8),
            "<u2" => Ok(Self::UInt16),
            "<u4" => Ok(Self::UInt32),
            "<u8" => Ok(Self::UInt64),
            "<f4" => Ok(Self::Float32),
            "<f8" => Ok(Self::Float64),
            other => Err(PhotonError::UnsupportedType(other.to_string())),
        }
    }

    /// Returns the size of one element in bytes.
    pub fn size_of(&self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }
}

/// Provides the canonical string representation for an `ElementType`.
impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // These string representations are part of the on-disk contract: they
        // appear in the `original_dtype` attribute and the database metadata.
        let name = match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        };
        write!(f, "{}", name)
    }
}
