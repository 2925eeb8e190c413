//! Client-side input validation
//!
//! These checks run before any identity or store call so that obviously bad
//! input never leaves the device.

use std::sync::OnceLock;

use regex::Regex;

use super::result::ValidationError;

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9+_.-]+@[A-Za-z0-9.-]+\.[a-zA-Z]{2,}$";
const USERNAME_PATTERN: &str = r"^[A-Za-zÀ-ÖØ-öø-ÿ]+(\s[A-Za-zÀ-ÖØ-öø-ÿ]+)+$";
const MIN_PASSWORD_LEN: usize = 6;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(USERNAME_PATTERN).expect("username pattern is valid"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// A username is two or more words of letters separated by single whitespace
pub fn is_valid_username(username: &str) -> bool {
    !username.trim().is_empty() && username_regex().is_match(username)
}

/// At least six characters on a single line, one of them an ASCII uppercase letter
pub fn is_valid_password(password: &str) -> bool {
    !password.contains(['\n', '\r'])
        && password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_ascii_uppercase())
}

/// Validate registration input
///
/// Checks run in order (blank fields, email, username, password) and the
/// first failure wins.
pub fn validate_registration(
    email: &str,
    password: &str,
    username: &str,
) -> Result<(), ValidationError> {
    if email.trim().is_empty() || password.trim().is_empty() || username.trim().is_empty() {
        return Err(ValidationError::EmptyFields);
    }
    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    if !is_valid_username(username) {
        return Err(ValidationError::InvalidUsername);
    }
    if !is_valid_password(password) {
        return Err(ValidationError::InvalidPassword);
    }
    Ok(())
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() || password.trim().is_empty() {
        return Err(ValidationError::EmptyFields);
    }
    Ok(())
}

/// A task needs both a title and a description
pub fn validate_new_task(title: &str, description: &str) -> Result<(), ValidationError> {
    if title.is_empty() || description.is_empty() {
        return Err(ValidationError::EmptyFields);
    }
    Ok(())
}

/// JPEG files start with the SOI marker followed by another marker byte
pub fn is_jpeg(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xFF, 0xD8, 0xFF])
}
