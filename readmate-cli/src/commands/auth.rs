//! Account commands - register, login, logout, whoami

use anyhow::Result;
use colored::Colorize;
use readmate_core::state::{LoginEvent, LoginState, RegisterEvent, RegisterState, SessionState};
use readmate_core::{LogEvent, OperationResult};

use super::{fail, get_context, get_logger, log_command, log_event, read_password};
use crate::output;

pub async fn register(email: String, username: String, password: Option<String>, json: bool) -> Result<()> {
    let logger = get_logger();
    log_command(&logger, "register");

    let password = read_password(password, true)?;
    let ctx = get_context()?;

    let mut state = RegisterState::new();
    state.apply(RegisterEvent::EmailChanged(email));
    state.apply(RegisterEvent::UsernameChanged(username));
    state.apply(RegisterEvent::PasswordChanged(password));

    let pb = output::spinner("Creating account...");
    let result = state.submit(&ctx.auth_service).await;
    pb.finish_and_clear();

    let user = result.map_err(|e| fail(&logger, "register_failed", "register", json, e))?;
    log_event(&logger, LogEvent::new("register_succeeded").with_screen("register"));

    if json {
        return output::print_json(&OperationResult::ok(&user));
    }
    output::success(&format!("Welcome, {}! You are signed in.", user.username));
    Ok(())
}

pub async fn login(email: String, password: Option<String>, json: bool) -> Result<()> {
    let logger = get_logger();
    log_command(&logger, "login");

    let password = read_password(password, false)?;
    let ctx = get_context()?;

    let mut state = LoginState::new();
    state.apply(LoginEvent::EmailChanged(email));
    state.apply(LoginEvent::PasswordChanged(password));

    let pb = output::spinner("Signing in...");
    let result = state.submit(&ctx.auth_service).await;
    pb.finish_and_clear();

    let session = result.map_err(|e| fail(&logger, "login_failed", "login", json, e))?;
    log_event(&logger, LogEvent::new("login_succeeded").with_screen("login"));

    if json {
        // Tokens stay in session.json
        return output::print_json(&OperationResult::ok(serde_json::json!({
            "userId": session.user_id,
            "email": session.email,
            "signedInAt": session.signed_in_at,
        })));
    }
    output::success(&format!("Signed in as {}", session.email));
    Ok(())
}

pub fn logout() -> Result<()> {
    let logger = get_logger();
    log_command(&logger, "logout");

    let ctx = get_context()?;
    let mut session = SessionState::new();
    session
        .logout(&ctx.auth_service)
        .map_err(|e| fail(&logger, "logout_failed", "logout", false, e))?;

    output::success("Signed out");
    Ok(())
}

pub async fn whoami(json: bool) -> Result<()> {
    let logger = get_logger();
    log_command(&logger, "whoami");

    let ctx = get_context()?;
    let mut session = SessionState::new();

    let pb = output::spinner("Loading profile...");
    let result = session.fetch_current_user(&ctx.auth_service).await;
    pb.finish_and_clear();

    let user = result.map_err(|e| fail(&logger, "whoami_failed", "whoami", json, e))?;

    if json {
        return output::print_json(&OperationResult::ok(&user));
    }

    let mut table = output::create_table();
    table.add_row(vec!["Name", &user.username]);
    table.add_row(vec!["Email", &user.email]);
    table.add_row(vec!["User ID", &user.id]);
    table.add_row(vec![
        "Member since".to_string(),
        user.created_at.format("%Y-%m-%d").to_string(),
    ]);

    println!("{}", "Signed in".bold());
    println!("{}", table);
    Ok(())
}
