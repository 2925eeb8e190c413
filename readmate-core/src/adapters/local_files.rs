//! Local filesystem file store

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::result::Result;
use crate::ports::FileStore;

/// Files kept under a private directory, created on first write
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl FileStore for LocalFileStore {
    fn root(&self) -> &Path {
        &self.root
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<PathBuf> {
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, bytes)?;
        Ok(std::path::absolute(&target)?)
    }

    fn delete(&self, path: &Path) -> Result<()> {
        fs::remove_file(self.resolve(path))?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }
}
