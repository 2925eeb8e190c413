//! Config command - view and edit settings.json

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use readmate_core::config::{Backend, Config, SETTINGS_FILE};

use super::{get_app_dir, get_logger, log_command};
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the current settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Select the backend (local, firebase, memory)
    Backend {
        name: String,
    },
    /// Set the Firebase project
    Firebase {
        #[arg(long)]
        api_key: String,
        #[arg(long)]
        project_id: String,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let logger = get_logger();
    let app_dir = get_app_dir()?;
    let mut config = Config::load(&app_dir)?;

    match command {
        ConfigCommands::Show { json } => {
            log_command(&logger, "config show");
            let api_key_set = config.firebase.api_key.as_deref().is_some_and(|k| !k.is_empty());

            if json {
                return output::print_json(&serde_json::json!({
                    "backend": config.backend.as_str(),
                    "requestTimeoutSecs": config.timeout().as_secs(),
                    "firebase": {
                        "apiKeySet": api_key_set,
                        "projectId": config.firebase.project_id,
                    },
                    "settingsPath": app_dir.join(SETTINGS_FILE).to_string_lossy(),
                }));
            }

            println!("{}", "Settings".bold());
            println!("  Backend: {}", config.backend.as_str());
            println!("  Request timeout: {}s", config.timeout().as_secs());
            println!(
                "  Firebase project: {}",
                config.firebase.project_id.as_deref().unwrap_or("(not set)")
            );
            println!(
                "  Firebase API key: {}",
                if api_key_set { "set" } else { "(not set)" }
            );
            println!("  File: {}", app_dir.join(SETTINGS_FILE).display());
        }
        ConfigCommands::Backend { name } => {
            log_command(&logger, "config backend");
            let backend: Backend = name.parse()?;
            config.set_backend(backend);
            config.save(&app_dir)?;
            output::success(&format!("Backend set to {}", backend.as_str()));
            if backend == Backend::Firebase && config.firebase.project_id.is_none() {
                output::warning("Set the project with `rmt config firebase --api-key .. --project-id ..`");
            }
        }
        ConfigCommands::Firebase { api_key, project_id } => {
            log_command(&logger, "config firebase");
            config.set_firebase_project(api_key, project_id);
            config.save(&app_dir)?;
            output::success("Firebase project saved");
        }
    }

    Ok(())
}
