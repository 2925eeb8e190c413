//! Identity port - email/password authentication

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::result::Result;

/// The client-local record of an authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user_id: String,
    pub email: String,
    pub signed_in_at: DateTime<Utc>,
    /// Bearer token for remote backends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthSession {
    /// A session without remote tokens
    pub fn local(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            signed_in_at: Utc::now(),
            id_token: None,
            refresh_token: None,
            expires_at: None,
        }
    }
}

/// Identity service abstraction
///
/// A successful `create_user` or `sign_in` becomes the current session.
/// `sign_out` only clears the local session.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Backend name (e.g., "local", "firebase")
    fn name(&self) -> &str;

    /// Create an account and sign it in
    async fn create_user(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Verify credentials and sign in
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// The currently authenticated session, if any
    fn current_session(&self) -> Option<AuthSession>;

    /// Clear the local session
    fn sign_out(&self) -> Result<()>;
}
