//! Logs command - inspect the local event log
//!
//! The log records which commands and screens were used and which operations
//! failed. It never holds passwords, tokens or task contents.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use readmate_core::services::logging::LogEntry;
use readmate_core::{EntryPoint, LoggingService, OperationResult};

use super::get_app_dir;
use crate::output;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent log entries
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Show only failed operations
        #[arg(long)]
        errors: bool,
        /// Only entries recorded for this screen or command (e.g. "login", "task add")
        #[arg(long)]
        only: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete old log entries
    Clear {
        /// Delete entries older than N days
        #[arg(long, default_value = "30")]
        older_than_days: i64,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show entry counts and the log database location
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Copy the log database, e.g. to attach to a bug report
    Export {
        /// Destination file
        output: PathBuf,
    },
}

fn open_log() -> Result<LoggingService> {
    LoggingService::new(&get_app_dir()?, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
}

/// Unix millis `days` before now
fn cutoff_ms(days: i64) -> Result<i64> {
    let age = Duration::try_days(days)
        .filter(|age| *age >= Duration::zero())
        .with_context(|| format!("--older-than-days {} is out of range", days))?;
    Utc::now()
        .checked_sub_signed(age)
        .map(|cutoff| cutoff.timestamp_millis())
        .with_context(|| format!("--older-than-days {} is out of range", days))
}

fn matches_context(entry: &LogEntry, only: &str) -> bool {
    entry.screen.as_deref() == Some(only) || entry.command.as_deref() == Some(only)
}

pub fn run(command: LogsCommands) -> Result<()> {
    match command {
        LogsCommands::List { limit, errors, only, json } => list(limit, errors, only.as_deref(), json),
        LogsCommands::Clear { older_than_days, force, json } => clear(older_than_days, force, json),
        LogsCommands::Stats { json } => stats(json),
        LogsCommands::Export { output } => export(output),
    }
}

fn list(limit: usize, errors: bool, only: Option<&str>, json: bool) -> Result<()> {
    let log = open_log()?;
    let mut entries = if errors {
        log.get_errors(limit)?
    } else {
        log.get_recent(limit)?
    };
    if let Some(only) = only {
        entries.retain(|entry| matches_context(entry, only));
    }

    if json {
        return output::print_json(&OperationResult::ok(&entries));
    }
    if entries.is_empty() {
        println!("{}", "Nothing logged yet.".dimmed());
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Time", "Event", "Screen", "Command", "Error"]);
    for entry in &entries {
        table.add_row(vec![
            output::format_timestamp(entry.timestamp),
            entry.event.clone(),
            entry.screen.clone().unwrap_or_default(),
            entry.command.clone().unwrap_or_default(),
            entry
                .error_message
                .as_deref()
                .map(|msg| msg.red().to_string())
                .unwrap_or_default(),
        ]);
    }
    println!("{}", table);
    println!("{}", format!("{} entr(ies) shown", entries.len()).dimmed());
    Ok(())
}

fn clear(older_than_days: i64, force: bool, json: bool) -> Result<()> {
    let cutoff = cutoff_ms(older_than_days)?;
    let log = open_log()?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete log entries older than {} day(s)?", older_than_days))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "Cancelled".dimmed());
            return Ok(());
        }
    }

    let deleted = log.delete_before(cutoff)?;
    if json {
        return output::print_json(&OperationResult::ok(serde_json::json!({ "deleted": deleted })));
    }
    output::success(&format!("Deleted {} log entr(ies)", deleted));
    Ok(())
}

fn stats(json: bool) -> Result<()> {
    let log = open_log()?;
    let total = log.count()?;
    let failures = log.count_errors()?;
    let path = log.db_path().to_path_buf();
    let size_bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

    if json {
        return output::print_json(&OperationResult::ok(serde_json::json!({
            "entries": total,
            "errors": failures,
            "path": path.to_string_lossy(),
            "sizeBytes": size_bytes,
        })));
    }

    let mut table = output::create_table();
    table.add_row(vec!["Entries".to_string(), total.to_string()]);
    table.add_row(vec!["Errors".to_string(), failures.to_string()]);
    table.add_row(vec!["Database".to_string(), path.display().to_string()]);
    table.add_row(vec!["Size".to_string(), format!("{} bytes", size_bytes)]);
    println!("{}", "Event log".bold());
    println!("{}", table);
    Ok(())
}

fn export(destination: PathBuf) -> Result<()> {
    let log = open_log()?;
    let written = log
        .export(&destination)
        .with_context(|| format!("Failed to export log to {}", destination.display()))?;
    output::success(&format!("Log copied to {}", written.display()));
    Ok(())
}
