// In: src/store/directory.rs

//! A filesystem-backed [`ObjectStore`]: each key maps to one file under a
//! fixed root directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::PhotonError;
use crate::store::ObjectStore;

/// Stores objects as plain files under `root`, with `/`-separated keys mapped
/// to relative file paths.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in key.split('/') {
            path.push(segment);
        }
        path
    }
}

impl ObjectStore for DirectoryStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), PhotonError> {
        let path = self.resolve(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, PhotonError> {
        match fs::read(self.resolve(key)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(PhotonError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn contains(&self, key: &str) -> Result<bool, PhotonError> {
        Ok(self.resolve(key).exists())
    }
}
