// In: src/registry.rs

//! A thin name-to-codec lookup for hosts that resolve codecs at runtime.
//!
//! The core codec knows nothing about this module; the registry only adapts
//! between a host's "look up capability by name" mechanism and the
//! [`SchemaCodec`] contract, so the core stays host-agnostic and testable on
//! its own.

use std::collections::HashMap;
use std::sync::Arc;

use crate::codec::SchemaCodec;

/// Maps codec names to codec instances.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: HashMap<&'static str, Arc<dyn SchemaCodec>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a codec under its own name, replacing any previous entry.
    pub fn register(&mut self, codec: Arc<dyn SchemaCodec>) {
        self.codecs.insert(codec.name(), codec);
    }

    /// Looks up a codec by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn SchemaCodec>> {
        self.codecs.get(name).cloned()
    }
}
