//! Configuration management
//!
//! Settings live in `settings.json` inside the application directory:
//! ```json
//! {
//!   "app": { "backend": "local", "requestTimeoutSecs": 30 },
//!   "firebase": { "apiKey": "...", "projectId": "..." }
//! }
//! ```
//! Unknown fields are preserved when the file is saved again.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub const SETTINGS_FILE: &str = "settings.json";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which adapter set the context wires up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Embedded DuckDB + local identities
    #[default]
    Local,
    /// Firebase Identity Toolkit + Firestore
    Firebase,
    /// Process-local maps, nothing persisted
    Memory,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Local => "local",
            Backend::Firebase => "firebase",
            Backend::Memory => "memory",
        }
    }
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Backend::Local),
            "firebase" => Ok(Backend::Firebase),
            "memory" => Ok(Backend::Memory),
            other => anyhow::bail!("Unknown backend '{}' (expected local, firebase or memory)", other),
        }
    }
}

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(default)]
    firebase: FirebaseSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    backend: Backend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_timeout_secs: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Firebase project settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Override for the Identity Toolkit base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_url: Option<String>,
    /// Override for the Secure Token base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    /// Override for the Firestore base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firestore_url: Option<String>,
}

/// ReadMate configuration (simplified view of settings)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub backend: Backend,
    pub request_timeout: Option<Duration>,
    pub firebase: FirebaseSettings,
    _raw_settings: SettingsFile,
}

impl Config {
    /// Load config from the application directory
    ///
    /// Environment overrides: `READMATE_BACKEND`, `READMATE_FIREBASE_API_KEY`
    /// and `READMATE_FIREBASE_PROJECT_ID`.
    pub fn load(app_dir: &Path) -> Result<Self> {
        let mut config = Self::load_file(app_dir)?;

        if let Some(value) = std::env::var("READMATE_BACKEND").ok().filter(|v| !v.trim().is_empty()) {
            config.backend = value.parse()?;
        }
        if let Ok(key) = std::env::var("READMATE_FIREBASE_API_KEY") {
            config.firebase.api_key = Some(key);
        }
        if let Ok(project) = std::env::var("READMATE_FIREBASE_PROJECT_ID") {
            config.firebase.project_id = Some(project);
        }
        Ok(config)
    }

    /// Load only what `settings.json` says, ignoring the environment
    pub fn load_file(app_dir: &Path) -> Result<Self> {
        let settings_path = app_dir.join(SETTINGS_FILE);

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        Ok(Self {
            backend: raw.app.backend,
            request_timeout: raw.app.request_timeout_secs.map(Duration::from_secs),
            firebase: raw.firebase.clone(),
            _raw_settings: raw,
        })
    }

    /// Save config, keeping settings this crate does not manage
    pub fn save(&self, app_dir: &Path) -> Result<()> {
        let settings_path = app_dir.join(SETTINGS_FILE);

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        settings.app.backend = self.backend;
        settings.app.request_timeout_secs = self.request_timeout.map(|d| d.as_secs());
        settings.firebase = self.firebase.clone();

        std::fs::create_dir_all(app_dir)?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Per-request timeout for remote calls
    pub fn timeout(&self) -> Duration {
        self.request_timeout
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn set_backend(&mut self, backend: Backend) {
        self.backend = backend;
    }

    pub fn set_firebase_project(&mut self, api_key: impl Into<String>, project_id: impl Into<String>) {
        self.firebase.api_key = Some(api_key.into());
        self.firebase.project_id = Some(project_id.into());
    }
}
