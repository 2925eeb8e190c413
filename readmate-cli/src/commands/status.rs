//! Status command - backend, session and task summary

use anyhow::Result;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;
use readmate_core::state::TaskListState;

use super::{fail, get_context, get_logger, log_command};
use crate::output;

#[derive(Debug, Serialize)]
struct StatusSummary {
    backend: String,
    app_dir: String,
    signed_in: bool,
    email: Option<String>,
    user_id: Option<String>,
    total_tasks: usize,
    completed_tasks: usize,
    pending_tasks: usize,
}

pub async fn run(json: bool) -> Result<()> {
    let logger = get_logger();
    log_command(&logger, "status");

    let ctx = get_context()?;
    let session = ctx.auth_service.current_session();

    let mut summary = StatusSummary {
        backend: ctx.backend_name().to_string(),
        app_dir: ctx.app_dir.display().to_string(),
        signed_in: session.is_some(),
        email: session.as_ref().map(|s| s.email.clone()),
        user_id: session.as_ref().map(|s| s.user_id.clone()),
        total_tasks: 0,
        completed_tasks: 0,
        pending_tasks: 0,
    };

    if let Some(session) = &session {
        let mut tasks = TaskListState::new();
        let pb = output::spinner("Loading tasks...");
        let result = tasks
            .refresh(&ctx.task_service, &session.user_id)
            .await
            .map(|_| ());
        pb.finish_and_clear();
        result.map_err(|e| fail(&logger, "status_failed", "status", json, e))?;

        summary.total_tasks = tasks.tasks().len();
        summary.completed_tasks = tasks.completed_count();
        summary.pending_tasks = tasks.pending().count();
    }

    if json {
        return output::print_json(&summary);
    }

    println!("{}", "ReadMate Status".bold());
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec!["Backend", &summary.backend]);
    table.add_row(vec!["Data directory", &summary.app_dir]);
    table.add_row(vec![
        "Signed in as",
        summary.email.as_deref().unwrap_or("nobody"),
    ]);
    if summary.signed_in {
        table.add_row(vec!["Tasks", &summary.total_tasks.to_string()]);
        table.add_row(vec!["Completed", &summary.completed_tasks.to_string()]);
        table.add_row(vec!["Pending", &summary.pending_tasks.to_string()]);
    }
    println!("{}", table);

    if !summary.signed_in {
        println!();
        println!("{}", "Sign in with `rmt login --email <email>`".dimmed());
    }
    Ok(())
}
