//! Login screen state

use crate::domain::result::Result;
use crate::domain::UserMessage;
use crate::ports::AuthSession;
use crate::services::AuthService;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoginStatus {
    #[default]
    Idle,
    Loading,
    Success { user_id: String },
    Error(UserMessage),
}

#[derive(Debug, Clone)]
pub enum LoginEvent {
    EmailChanged(String),
    PasswordChanged(String),
    Submitted,
    Succeeded(String),
    Failed(UserMessage),
}

#[derive(Debug, Default)]
pub struct LoginState {
    email: String,
    password: String,
    status: LoginStatus,
}

impl LoginState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn status(&self) -> &LoginStatus {
        &self.status
    }

    pub fn apply(&mut self, event: LoginEvent) {
        match event {
            LoginEvent::EmailChanged(email) => {
                self.email = email;
                self.status = LoginStatus::Idle;
            }
            LoginEvent::PasswordChanged(password) => {
                self.password = password;
                self.status = LoginStatus::Idle;
            }
            LoginEvent::Submitted => self.status = LoginStatus::Loading,
            LoginEvent::Succeeded(user_id) => {
                self.password.clear();
                self.status = LoginStatus::Success { user_id };
            }
            LoginEvent::Failed(message) => self.status = LoginStatus::Error(message),
        }
    }

    pub async fn submit(&mut self, auth: &AuthService) -> Result<AuthSession> {
        self.apply(LoginEvent::Submitted);
        match auth.login(&self.email, &self.password).await {
            Ok(session) => {
                self.apply(LoginEvent::Succeeded(session.user_id.clone()));
                Ok(session)
            }
            Err(e) => {
                self.apply(LoginEvent::Failed(e.user_message()));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::adapters::memory::{InMemoryDocumentStore, InMemoryIdentityProvider};

    async fn signed_up() -> (Arc<InMemoryIdentityProvider>, AuthService) {
        let identity = Arc::new(InMemoryIdentityProvider::new());
        let auth = AuthService::new(identity.clone(), Arc::new(InMemoryDocumentStore::new()));
        auth.register("ana@example.com", "Secret1", "Ana Lopez").await.unwrap();
        auth.logout().unwrap();
        (identity, auth)
    }

    fn form(email: &str, password: &str) -> LoginState {
        let mut state = LoginState::new();
        state.apply(LoginEvent::EmailChanged(email.into()));
        state.apply(LoginEvent::PasswordChanged(password.into()));
        state
    }

    #[tokio::test]
    async fn test_submit_success() {
        let (_, auth) = signed_up().await;
        let mut state = form("ana@example.com", "Secret1");

        let session = state.submit(&auth).await.unwrap();
        assert_eq!(
            state.status(),
            &LoginStatus::Success { user_id: session.user_id }
        );
    }

    #[tokio::test]
    async fn test_submit_failures_map_to_messages() {
        let (identity, auth) = signed_up().await;

        let mut wrong = form("ana@example.com", "Wrong1");
        assert!(wrong.submit(&auth).await.is_err());
        assert_eq!(wrong.status(), &LoginStatus::Error(UserMessage::InvalidCredentials));

        let mut unknown = form("bob@example.com", "Secret1");
        assert!(unknown.submit(&auth).await.is_err());
        assert_eq!(unknown.status(), &LoginStatus::Error(UserMessage::InvalidCredentials));

        identity.set_offline(true);
        let mut offline = form("ana@example.com", "Secret1");
        assert!(offline.submit(&auth).await.is_err());
        assert_eq!(offline.status(), &LoginStatus::Error(UserMessage::Server));
    }
}
