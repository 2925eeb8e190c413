//! Task commands - add, list, show, complete and delete tasks

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use readmate_core::state::{NewTaskEvent, NewTaskForm, TaskListState};
use readmate_core::{LogEvent, OperationResult, Task};

use super::{fail, get_context, get_logger, log_command, log_event};
use crate::output;

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Create a task
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Due time, "YYYY-MM-DD" or "YYYY-MM-DD HH:MM" in local time (default: now)
        #[arg(long)]
        due: Option<String>,
        /// JPEG image to attach
        #[arg(long)]
        image: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List your tasks
    List {
        /// Only tasks that are not completed
        #[arg(long)]
        pending: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single task
    Show {
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark tasks as completed
    Done {
        #[arg(required = true)]
        ids: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete tasks and their images
    Rm {
        #[arg(required = true)]
        ids: Vec<String>,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Parse a local due time; a bare date means midnight
fn parse_due(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    let naive = match NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M") {
        Ok(dt) => dt,
        Err(_) => NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .with_context(|| format!("Invalid due time '{}', expected YYYY-MM-DD[ HH:MM]", input))?
            .and_hms_opt(0, 0, 0)
            .context("Invalid due time")?,
    };

    match Local.from_local_datetime(&naive).earliest() {
        Some(local) => Ok(local.with_timezone(&Utc)),
        None => bail!("Due time '{}' does not exist in the local timezone", input),
    }
}

pub async fn run(command: TaskCommands) -> Result<()> {
    match command {
        TaskCommands::Add { title, description, due, image, json } => {
            add(title, description, due, image, json).await
        }
        TaskCommands::List { pending, json } => list(pending, json).await,
        TaskCommands::Show { id, json } => show(&id, json).await,
        TaskCommands::Done { ids, json } => done(ids, json).await,
        TaskCommands::Rm { ids, force, json } => remove(ids, force, json).await,
    }
}

async fn add(
    title: String,
    description: String,
    due: Option<String>,
    image: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let logger = get_logger();
    log_command(&logger, "task add");

    let due_at = due.as_deref().map(parse_due).transpose()?;
    let image_bytes = match &image {
        Some(path) => Some(
            std::fs::read(path).with_context(|| format!("Failed to read image {}", path.display()))?,
        ),
        None => None,
    };

    let ctx = get_context()?;
    let user_id = ctx
        .auth_service
        .require_user_id()
        .map_err(|e| fail(&logger, "task_add_failed", "task add", json, e))?;

    let mut form = NewTaskForm::new();
    form.apply(NewTaskEvent::TitleChanged(title));
    form.apply(NewTaskEvent::DescriptionChanged(description));
    form.apply(NewTaskEvent::DueChanged(due_at));
    if let Some(bytes) = image_bytes {
        form.apply(NewTaskEvent::ImageAttached(bytes));
    }

    let pb = output::spinner("Saving task...");
    let result = form.create(&ctx.task_service, &user_id).await;
    pb.finish_and_clear();

    let task = result.map_err(|e| fail(&logger, "task_add_failed", "task add", json, e))?;
    log_event(&logger, LogEvent::new("task_created").with_screen("new_task"));

    if json {
        return output::print_json(&OperationResult::ok(&task));
    }
    output::success(&format!("Created task {}", task.id));
    Ok(())
}

async fn list(pending: bool, json: bool) -> Result<()> {
    let logger = get_logger();
    log_command(&logger, "task list");

    let ctx = get_context()?;
    let user_id = ctx
        .auth_service
        .require_user_id()
        .map_err(|e| fail(&logger, "task_list_failed", "task list", json, e))?;

    let mut state = TaskListState::new();
    let pb = output::spinner("Loading tasks...");
    let result = state.refresh(&ctx.task_service, &user_id).await.map(|_| ());
    pb.finish_and_clear();
    result.map_err(|e| fail(&logger, "task_list_failed", "task list", json, e))?;

    let tasks: Vec<&Task> = if pending {
        state.pending().collect()
    } else {
        state.tasks().iter().collect()
    };

    if json {
        return output::print_json(&OperationResult::ok(&tasks));
    }

    if tasks.is_empty() {
        println!("No tasks yet. Add one with `rmt task add`.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["ID", "Title", "Due", "Done", "Image"]);
    for task in &tasks {
        table.add_row(vec![
            task.id.clone(),
            task.title.clone(),
            output::format_due(task.due_at),
            if task.completed { "✓".green().to_string() } else { String::new() },
            if ctx.task_service.image_for_display(task).is_some() {
                "yes".to_string()
            } else {
                String::new()
            },
        ]);
    }
    println!("{}", table);
    println!(
        "{}",
        format!(
            "{} task(s), {} completed",
            state.tasks().len(),
            state.completed_count()
        )
        .dimmed()
    );
    Ok(())
}

async fn show(id: &str, json: bool) -> Result<()> {
    let logger = get_logger();
    log_command(&logger, "task show");

    let ctx = get_context()?;
    let user_id = ctx
        .auth_service
        .require_user_id()
        .map_err(|e| fail(&logger, "task_show_failed", "task show", json, e))?;

    let pb = output::spinner("Loading task...");
    let result = ctx.task_service.get_owned_task(id, &user_id).await;
    pb.finish_and_clear();

    let task = result.map_err(|e| fail(&logger, "task_show_failed", "task show", json, e))?;

    if json {
        return output::print_json(&OperationResult::ok(&task));
    }

    let mut table = output::create_table();
    table.add_row(vec!["ID", &task.id]);
    table.add_row(vec!["Title", &task.title]);
    table.add_row(vec!["Description", &task.description]);
    table.add_row(vec!["Due".to_string(), output::format_due(task.due_at)]);
    table.add_row(vec!["Completed", if task.completed { "yes" } else { "no" }]);
    if let Some(path) = ctx.task_service.image_for_display(&task) {
        table.add_row(vec!["Image".to_string(), path.display().to_string()]);
    }
    println!("{}", table);
    Ok(())
}

async fn done(ids: Vec<String>, json: bool) -> Result<()> {
    let logger = get_logger();
    log_command(&logger, "task done");

    let ctx = get_context()?;
    let user_id = ctx
        .auth_service
        .require_user_id()
        .map_err(|e| fail(&logger, "task_done_failed", "task done", json, e))?;

    let mut state = TaskListState::new();
    let mut completed = Vec::new();
    for id in &ids {
        let pb = output::spinner(&format!("Completing {}...", id));
        let result = match ctx.task_service.get_owned_task(id, &user_id).await {
            Ok(_) => state.complete(&ctx.task_service, id, &user_id).await,
            Err(e) => Err(e),
        };
        pb.finish_and_clear();

        result.map_err(|e| fail(&logger, "task_done_failed", "task done", json, e))?;
        completed.push(id.clone());
        if !json {
            output::success(&format!("Completed {}", id));
        }
    }
    log_event(&logger, LogEvent::new("tasks_completed").with_screen("home"));

    if json {
        return output::print_json(&OperationResult::ok(&completed));
    }
    output::info(&format!("{} pending task(s) left", state.pending().count()));
    Ok(())
}

async fn remove(ids: Vec<String>, force: bool, json: bool) -> Result<()> {
    let logger = get_logger();
    log_command(&logger, "task rm");

    let ctx = get_context()?;
    let user_id = ctx
        .auth_service
        .require_user_id()
        .map_err(|e| fail(&logger, "task_rm_failed", "task rm", json, e))?;

    if !force && !json {
        println!("\n{}", format!("This will delete {} task(s) and their images.", ids.len()).yellow());
        if !Confirm::new()
            .with_prompt("Are you sure?")
            .default(false)
            .interact()?
        {
            println!("{}\n", "Cancelled".dimmed());
            return Ok(());
        }
    }

    let mut state = TaskListState::new();
    let mut deletions = Vec::new();
    for id in &ids {
        let pb = output::spinner(&format!("Deleting {}...", id));
        let result = match ctx.task_service.get_owned_task(id, &user_id).await {
            Ok(_) => state.delete(&ctx.task_service, id, &user_id).await,
            Err(e) => Err(e),
        };
        pb.finish_and_clear();

        let deletion = result.map_err(|e| fail(&logger, "task_rm_failed", "task rm", json, e))?;
        if !json {
            for warning in &deletion.warnings {
                output::warning(warning);
            }
            output::success(&format!("Deleted {}", id));
        }
        deletions.push(deletion);
    }
    log_event(&logger, LogEvent::new("tasks_deleted").with_screen("home"));

    if json {
        return output::print_json(&OperationResult::ok(&deletions));
    }
    Ok(())
}
