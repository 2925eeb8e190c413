//! Registration screen state

use crate::domain::result::Result;
use crate::domain::{User, UserMessage};
use crate::services::AuthService;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegisterStatus {
    #[default]
    Idle,
    Loading,
    Success(User),
    Error(UserMessage),
}

#[derive(Debug, Clone)]
pub enum RegisterEvent {
    EmailChanged(String),
    PasswordChanged(String),
    UsernameChanged(String),
    Submitted,
    Succeeded(User),
    Failed(UserMessage),
}

#[derive(Debug, Default)]
pub struct RegisterState {
    email: String,
    password: String,
    username: String,
    status: RegisterStatus,
}

impl RegisterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &RegisterStatus {
        &self.status
    }

    pub fn apply(&mut self, event: RegisterEvent) {
        match event {
            RegisterEvent::EmailChanged(email) => self.email = email,
            RegisterEvent::PasswordChanged(password) => self.password = password,
            RegisterEvent::UsernameChanged(username) => self.username = username,
            RegisterEvent::Submitted => self.status = RegisterStatus::Loading,
            RegisterEvent::Succeeded(user) => {
                self.password.clear();
                self.status = RegisterStatus::Success(user);
            }
            RegisterEvent::Failed(message) => self.status = RegisterStatus::Error(message),
        }
    }

    pub async fn submit(&mut self, auth: &AuthService) -> Result<User> {
        self.apply(RegisterEvent::Submitted);
        match auth.register(&self.email, &self.password, &self.username).await {
            Ok(user) => {
                self.apply(RegisterEvent::Succeeded(user.clone()));
                Ok(user)
            }
            Err(e) => {
                self.apply(RegisterEvent::Failed(e.user_message()));
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
    use crate::domain::USERS_COLLECTION;

    fn form(email: &str, password: &str, username: &str) -> RegisterState {
        let mut state = RegisterState::new();
        state.apply(RegisterEvent::EmailChanged(email.into()));
        state.apply(RegisterEvent::PasswordChanged(password.into()));
        state.apply(RegisterEvent::UsernameChanged(username.into()));
        state
    }

    #[tokio::test]
    async fn test_invalid_username_message() {
        let auth = AuthService::new(
            Arc::new(InMemoryIdentityProvider::new()),
            Arc::new(InMemoryDocumentStore::new()),
        );
        let mut state = form("ana@example.com", "Secret1", "Ana");

        assert!(state.submit(&auth).await.is_err());
        assert_eq!(state.status(), &RegisterStatus::Error(UserMessage::InvalidUsername));
    }

    #[tokio::test]
    async fn test_profile_failure_message() {
        let store = Arc::new(InMemoryDocumentStore::new());
        store.fail_writes_to(USERS_COLLECTION);
        let auth = AuthService::new(Arc::new(InMemoryIdentityProvider::new()), store);
        let mut state = form("ana@example.com", "Secret1", "Ana Lopez");

        assert!(state.submit(&auth).await.is_err());
        assert_eq!(state.status(), &RegisterStatus::Error(UserMessage::ProfileSaveFailed));
    }

    #[tokio::test]
    async fn test_email_in_use() {
        let auth = AuthService::new(
            Arc::new(InMemoryIdentityProvider::new()),
            Arc::new(InMemoryDocumentStore::new()),
        );
        let mut first = form("ana@example.com", "Secret1", "Ana Lopez");
        first.submit(&auth).await.unwrap();
        assert!(matches!(first.status(), RegisterStatus::Success(u) if u.username == "Ana Lopez"));

        let mut second = form("ana@example.com", "Secret2", "Ana Maria");
        assert!(second.submit(&auth).await.is_err());
        assert_eq!(second.status(), &RegisterStatus::Error(UserMessage::EmailInUse));
    }
}
