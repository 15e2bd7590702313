//! Asset access.
//!
//! Loaders never open files themselves. They ask an [`AssetSource`] for the
//! whole contents of a logical path and get either the bytes or `None`.
//! Dropping the returned buffer releases it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Read-only provider of whole files by logical path.
pub trait AssetSource {
    /// Read the whole file at `path`, or `None` if it is not available.
    fn read(&self, path: &str) -> Option<Vec<u8>>;
}

/// Assets stored under a directory on disk.
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    /// Resolve logical paths relative to `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The directory logical paths are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirAssets {
    fn read(&self, path: &str) -> Option<Vec<u8>> {
        let full = self.root.join(path);
        match std::fs::read(&full) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::debug!("Failed to read {}: {}", full.display(), e);
                None
            }
        }
    }
}

/// In-memory assets, keyed by logical path.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }
}

impl AssetSource for MemoryAssets {
    fn read(&self, path: &str) -> Option<Vec<u8>> {
        self.files.get(path).cloned()
    }
}
