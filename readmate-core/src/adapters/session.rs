//! Client-local session persistence
//!
//! The authenticated session outlives a single CLI process, so it is written
//! to `session.json` in the application directory. Tests keep it in memory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::domain::result::{Error, Result};
use crate::ports::AuthSession;

pub const SESSION_FILE: &str = "session.json";

/// Holds the current `AuthSession`, optionally backed by a file
pub struct SessionStore {
    path: Option<PathBuf>,
    current: Mutex<Option<AuthSession>>,
}

impl SessionStore {
    /// Session persisted in `<dir>/session.json`
    ///
    /// An unreadable or corrupt file is treated as signed out.
    pub fn in_dir(dir: &Path) -> Self {
        let path = dir.join(SESSION_FILE);
        let current = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str::<AuthSession>(&content).ok());
        Self {
            path: Some(path),
            current: Mutex::new(current),
        }
    }

    /// Session kept only for the lifetime of this value
    pub fn in_memory() -> Self {
        Self {
            path: None,
            current: Mutex::new(None),
        }
    }

    pub fn load(&self) -> Option<AuthSession> {
        self.current.lock().ok().and_then(|s| s.clone())
    }

    pub fn save(&self, session: &AuthSession) -> Result<()> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string_pretty(session)?)?;
        }
        *self.lock()? = Some(session.clone());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if let Some(path) = &self.path {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        *self.lock()? = None;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<AuthSession>>> {
        self.current
            .lock()
            .map_err(|e| Error::store(format!("session lock poisoned: {e}")))
    }
}
