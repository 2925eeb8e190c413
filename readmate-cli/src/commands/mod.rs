//! CLI command implementations

pub mod auth;
pub mod config;
pub mod logs;
pub mod status;
pub mod task;

use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use dialoguer::Password;
use readmate_core::{EntryPoint, Error, LogEvent, LoggingService, OperationResult, ReadmateContext};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let app_dir = get_app_dir().ok()?;
    LoggingService::new(&app_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Log the start of a command
pub fn log_command(logger: &Option<LoggingService>, command: &str) {
    log_event(logger, LogEvent::new("command_executed").with_command(command));
}

/// Get the application directory from environment or default
pub fn get_app_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("READMATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".readmate"))
}

/// Get or create the ReadMate context
pub fn get_context() -> Result<ReadmateContext> {
    let app_dir = get_app_dir()?;
    std::fs::create_dir_all(&app_dir)
        .with_context(|| format!("Failed to create app directory: {:?}", app_dir))?;

    ReadmateContext::new(&app_dir).context("Failed to initialize readmate context")
}

/// Record a failed core operation and turn it into the message shown to the user
///
/// With `--json` the failure is also printed as an `OperationResult`.
pub fn fail(logger: &Option<LoggingService>, event: &str, command: &str, json: bool, err: Error) -> anyhow::Error {
    let message = err.user_message();
    log_event(
        logger,
        LogEvent::new(event)
            .with_command(command)
            .with_error(message.to_string())
            .with_error_details(err.to_string()),
    );

    if json {
        let result: OperationResult<()> = Err(err).into();
        if let Ok(text) = serde_json::to_string_pretty(&result) {
            println!("{}", text);
        }
    }
    anyhow!("{}", message)
}

/// Get a password from the flag, `READMATE_PASSWORD`, a prompt, or stdin
pub fn read_password(flag: Option<String>, confirm: bool) -> Result<String> {
    if let Some(p) = flag {
        return Ok(p);
    }
    if let Ok(p) = std::env::var("READMATE_PASSWORD") {
        return Ok(p);
    }

    if atty::is(atty::Stream::Stdin) {
        let prompt = Password::new().with_prompt("Password");
        let prompt = if confirm {
            prompt.with_confirmation("Confirm password", "Passwords do not match")
        } else {
            prompt
        };
        return Ok(prompt.interact()?);
    }

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
