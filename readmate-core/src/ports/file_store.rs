//! Local file store port

use std::path::{Path, PathBuf};

use crate::domain::result::Result;

/// Device-local file storage for task images
///
/// Relative paths resolve against `root()`. No concurrency guards: two
/// writes to the same path race and the last one wins.
pub trait FileStore: Send + Sync {
    /// Private directory files are written to
    fn root(&self) -> &Path;

    /// Write `bytes` to `path`, overwriting any existing file
    ///
    /// Returns the absolute path of the written file.
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<PathBuf>;

    /// Delete the file at `path`
    fn delete(&self, path: &Path) -> Result<()>;

    /// Whether a file exists at `path`
    fn exists(&self, path: &Path) -> bool;
}
