//! This module defines `CountArray`, the type-erased input container accepted
//! by the codec's host-facing API.
//!
//! The enum is closed over the numeric element types the codec supports, so
//! "is this a structured numeric array?" is answered by the type system rather
//! than by runtime reflection. Data-dependent preconditions (rank, negativity)
//! still live in the validator.

use ndarray::ArrayD;
use num_traits::Zero;

use crate::types::ElementType;

/// A photon-count array of any supported element type, rank-erased via
/// `ndarray::ArrayD`.
#[derive(Debug, Clone)]
pub enum CountArray {
    Int8(ArrayD<i8>),
    Int16(ArrayD<i16>),
    Int32(ArrayD<i32>),
    Int64(ArrayD<i64>),
    UInt8(ArrayD<u8>),
    UInt16(ArrayD<u16>),
    UInt32(ArrayD<u32>),
    UInt64(ArrayD<u64>),
    Float32(ArrayD<f32>),
    Float64(ArrayD<f64>),
}

/// Implements the per-variant plumbing in one place so adding an element type
/// cannot silently miss a method.
macro_rules! for_each_variant {
    ($self:expr, $arr:ident => $body:expr) => {
        match $self {
            CountArray::Int8($arr) => $body,
            CountArray::Int16($arr) => $body,
            CountArray::Int32($arr) => $body,
            CountArray::Int64($arr) => $body,
            CountArray::UInt8($arr) => $body,
            CountArray::UInt16($arr) => $body,
            CountArray::UInt32($arr) => $body,
            CountArray::UInt64($arr) => $body,
            CountArray::Float32($arr) => $body,
            CountArray::Float64($arr) => $body,
        }
    };
}

impl CountArray {
    /// The element type of the wrapped array.
    pub fn element_type(&self) -> ElementType {
        match self {
            CountArray::Int8(_) => ElementType::Int8,
            CountArray::Int16(_) => ElementType::Int16,
            CountArray::Int32(_) => ElementType::Int32,
            CountArray::Int64(_) => ElementType::Int64,
            CountArray::UInt8(_) => ElementType::UInt8,
            CountArray::UInt16(_) => ElementType::UInt16,
            CountArray::UInt32(_) => ElementType::UInt32,
            CountArray::UInt64(_) => ElementType::UInt64,
            CountArray::Float32(_) => ElementType::Float32,
            CountArray::Float64(_) => ElementType::Float64,
        }
    }

    /// The shape of the wrapped array.
    pub fn shape(&self) -> &[usize] {
        for_each_variant!(self, arr => arr.shape())
    }

    /// The number of dimensions of the wrapped array.
    pub fn ndim(&self) -> usize {
        for_each_variant!(self, arr => arr.ndim())
    }

    /// Returns `true` if any element is strictly negative.
    ///
    /// The comparison is trivially false for unsigned variants. For float
    /// variants a NaN compares false against zero, mirroring an elementwise
    /// `x < 0` test.
    pub fn has_negative(&self) -> bool {
        for_each_variant!(self, arr => arr.iter().any(|&v| v < Zero::zero()))
    }

    /// Converts the wrapped array into an `ArrayD<f64>` (lossless for every
    /// integer type up to 52 bits of magnitude; photon counts are far below).
    pub fn to_f64(&self) -> ArrayD<f64> {
        for_each_variant!(self, arr => arr.mapv(|v| v as f64))
    }
}

macro_rules! impl_from_arrayd {
    ($t:ty, $variant:ident) => {
        impl From<ArrayD<$t>> for CountArray {
            fn from(arr: ArrayD<$t>) -> Self {
                CountArray::$variant(arr)
            }
        }
    };
}

impl_from_arrayd!(i8, Int8);
impl_from_arrayd!(i16, Int16);
impl_from_arrayd!(i32, Int32);
impl_from_arrayd!(i64, Int64);
impl_from_arrayd!(u8, UInt8);
impl_from_arrayd!(u16, UInt16);
impl_from_arrayd!(u32, UInt32);
impl_from_arrayd!(u64, UInt64);
impl_from_arrayd!(f32, Float32);
impl_from_arrayd!(f64, Float64);

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    #[test]
    fn test_element_type_and_shape_are_reported() {
        let arr = ArrayD::<u16>::zeros(IxDyn(&[4, 2, 2]));
        let counts = CountArray::from(arr);
        assert_eq!(counts.element_type(), ElementType::UInt16);
        assert_eq!(counts.shape(), &[4, 2, 2]);
        assert_eq!(counts.ndim(), 3);
    }

    #[test]
    fn test_has_negative_detects_signed_values() {
        let mut arr = ArrayD::<i32>::zeros(IxDyn(&[2, 2, 2]));
        assert!(!CountArray::from(arr.clone()).has_negative());
        arr[IxDyn(&[1, 0, 1])] = -1;
        assert!(CountArray::from(arr).has_negative());
    }

    #[test]
    fn test_has_negative_is_trivially_false_for_unsigned() {
        let arr = ArrayD::<u8>::from_elem(IxDyn(&[1, 1, 1]), 255);
        assert!(!CountArray::from(arr).has_negative());
    }

    #[test]
    fn test_to_f64_preserves_values_and_shape() {
        let arr = ArrayD::<u8>::from_shape_vec(IxDyn(&[1, 2, 2]), vec![0, 1, 2, 3]).unwrap();
        let floats = CountArray::from(arr).to_f64();
        assert_eq!(floats.shape(), &[1, 2, 2]);
        assert_eq!(floats.iter().copied().collect::<Vec<_>>(), vec![0.0, 1.0, 2.0, 3.0]);
    }
}
