//! ReadMate CLI - your task list in the terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{auth, config, logs, status, task};

/// ReadMate - your task list in the terminal
#[derive(Parser)]
#[command(name = "rmt", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        /// First and last name
        #[arg(long)]
        username: String,
        /// Password (prompted or read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign in
    Login {
        #[arg(long)]
        email: String,
        /// Password (prompted or read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign out on this device
    Logout,

    /// Show the signed-in user
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show backend, session and task summary
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: task::TaskCommands,
    },

    /// View or edit settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Register { email, username, password, json } => {
            auth::register(email, username, password, json).await
        }
        Commands::Login { email, password, json } => auth::login(email, password, json).await,
        Commands::Logout => auth::logout(),
        Commands::Whoami { json } => auth::whoami(json).await,
        Commands::Status { json } => status::run(json).await,
        Commands::Task { command } => task::run(command).await,
        Commands::Config { command } => config::run(command),
        Commands::Logs { command } => logs::run(command),
    }
}
