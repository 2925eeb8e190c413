//! Result and error types for the core library

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Client-side validation failures, raised before any remote call
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("all fields are required")]
    EmptyFields,

    #[error("email address is not valid")]
    InvalidEmail,

    #[error("username must contain at least two words")]
    InvalidUsername,

    #[error("password must have at least 6 characters and one uppercase letter")]
    InvalidPassword,

    #[error("image is not a JPEG")]
    UnsupportedImage,
}

/// Failures reported by the identity service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("invalid email")]
    InvalidEmail,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("no account for this email")]
    UnknownAccount,

    #[error("email already in use")]
    EmailInUse,

    #[error("password too weak")]
    WeakPassword,

    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    Other(String),
}

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Failed to save user profile: {0}")]
    ProfileWrite(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Map this error to the message shown to the user
    pub fn user_message(&self) -> UserMessage {
        match self {
            Error::Validation(v) => match v {
                ValidationError::EmptyFields => UserMessage::EmptyFields,
                ValidationError::InvalidEmail => UserMessage::InvalidEmail,
                ValidationError::InvalidUsername => UserMessage::InvalidUsername,
                ValidationError::InvalidPassword => UserMessage::InvalidPassword,
                ValidationError::UnsupportedImage => UserMessage::ImageError,
            },
            Error::Identity(i) => match i {
                IdentityError::InvalidEmail => UserMessage::InvalidEmail,
                IdentityError::InvalidCredentials | IdentityError::UnknownAccount => {
                    UserMessage::InvalidCredentials
                }
                IdentityError::EmailInUse => UserMessage::EmailInUse,
                IdentityError::WeakPassword => UserMessage::InvalidPassword,
                IdentityError::Network(_) => UserMessage::Server,
                IdentityError::Other(_) => UserMessage::Unknown,
            },
            Error::NotAuthenticated => UserMessage::NotSignedIn,
            Error::NotFound(_) => UserMessage::NotFound,
            Error::ProfileWrite(_) => UserMessage::ProfileSaveFailed,
            Error::Network(_) | Error::Store(_) => UserMessage::Server,
            Error::Io(_) => UserMessage::ImageError,
            Error::Database(_) | Error::Config(_) | Error::Json(_) => UserMessage::Unknown,
        }
    }
}

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        Self::Database(e.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// User-facing message for a failed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserMessage {
    EmptyFields,
    InvalidEmail,
    InvalidUsername,
    InvalidPassword,
    InvalidCredentials,
    EmailInUse,
    ProfileSaveFailed,
    NotSignedIn,
    NotFound,
    ImageError,
    Server,
    Unknown,
}

impl fmt::Display for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UserMessage::EmptyFields => "Please fill in all fields.",
            UserMessage::InvalidEmail => "The email address is not valid.",
            UserMessage::InvalidUsername => "Enter your first and last name.",
            UserMessage::InvalidPassword => {
                "The password needs at least 6 characters and one uppercase letter."
            }
            UserMessage::InvalidCredentials => "Incorrect email or password.",
            UserMessage::EmailInUse => "An account already exists for this email.",
            UserMessage::ProfileSaveFailed => "Your account was created but the profile could not be saved.",
            UserMessage::NotSignedIn => "You are not signed in.",
            UserMessage::NotFound => "The requested item does not exist.",
            UserMessage::ImageError => "The image could not be saved.",
            UserMessage::Server => "Could not reach the server. Check your connection and try again.",
            UserMessage::Unknown => "Something went wrong. Please try again.",
        };
        f.write_str(text)
    }
}

/// Operation result (serialised for `--json` output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub message: Option<UserMessage>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    /// Create a failed result
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self {
                message: Some(e.user_message()),
                ..Self::fail(e.to_string())
            },
        }
    }
}
