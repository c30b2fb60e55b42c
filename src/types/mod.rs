//! This module defines the core, strongly-typed data representations used
//! throughout the photon codec.
//!
//! It includes the canonical `ElementType` enum, which replaces fragile
//! string-based dtypes with a safe, serializable enum, and the `CountArray`
//! enum, the type-erased input container accepted by the codec.

pub mod count_array;
pub mod element_type;

// Re-export the main types for easier access.
pub use count_array::CountArray;
pub use element_type::ElementType;
