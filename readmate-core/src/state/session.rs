//! Session state - who is signed in

use crate::domain::result::Result;
use crate::domain::{User, UserMessage};
use crate::services::AuthService;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Unauthenticated,
    Authenticating,
    Authenticated(User),
    Failed(UserMessage),
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Started,
    Loaded(User),
    Failed(UserMessage),
    SignedOut,
}

#[derive(Debug, Default)]
pub struct SessionState {
    status: SessionStatus,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn user(&self) -> Option<&User> {
        match &self.status {
            SessionStatus::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn apply(&mut self, event: SessionEvent) {
        self.status = match event {
            SessionEvent::Started => SessionStatus::Authenticating,
            SessionEvent::Loaded(user) => SessionStatus::Authenticated(user),
            SessionEvent::Failed(message) => SessionStatus::Failed(message),
            SessionEvent::SignedOut => SessionStatus::Unauthenticated,
        };
    }

    /// Load the profile of the signed-in user
    pub async fn fetch_current_user(&mut self, auth: &AuthService) -> Result<User> {
        self.apply(SessionEvent::Started);

        let result = match auth.require_user_id() {
            Ok(user_id) => auth.get_user_details(&user_id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(user) => {
                self.apply(SessionEvent::Loaded(user.clone()));
                Ok(user)
            }
            Err(e) => {
                self.apply(SessionEvent::Failed(e.user_message()));
                Err(e)
            }
        }
    }

    pub fn logout(&mut self, auth: &AuthService) -> Result<()> {
        auth.logout()?;
        self.apply(SessionEvent::SignedOut);
        Ok(())
    }
}
