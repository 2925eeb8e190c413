//! Auth service - identity calls plus user profile documents

use std::sync::Arc;

use chrono::Utc;

use crate::domain::result::{Error, Result};
use crate::domain::validation::{validate_login, validate_registration};
use crate::domain::{User, USERS_COLLECTION};
use crate::ports::{AuthSession, DocumentStore, IdentityProvider};

/// Registration, login and profile lookup
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
}

impl AuthService {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self { identity, store }
    }

    /// Name of the identity backend in use
    pub fn backend_name(&self) -> &str {
        self.identity.name()
    }

    /// Create an account and its profile document
    ///
    /// Input is validated before the identity service is contacted. If the
    /// profile write fails the account is left in place and
    /// `Error::ProfileWrite` is returned.
    pub async fn register(&self, email: &str, password: &str, username: &str) -> Result<User> {
        validate_registration(email, password, username)?;

        let session = self.identity.create_user(email, password).await?;
        let user = User::new(session.user_id, username.trim(), session.email, Utc::now());

        self.store
            .set(USERS_COLLECTION, &user.id, user.to_document())
            .await
            .map_err(|e| Error::ProfileWrite(e.to_string()))?;

        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        validate_login(email, password)?;
        self.identity.sign_in(email, password).await
    }

    /// Fetch the profile document of `user_id`
    pub async fn get_user_details(&self, user_id: &str) -> Result<User> {
        self.store
            .get(USERS_COLLECTION, user_id)
            .await?
            .and_then(|doc| User::from_document(user_id, &doc))
            .ok_or_else(|| Error::not_found(format!("user {user_id}")))
    }

    pub fn current_session(&self) -> Option<AuthSession> {
        self.identity.current_session()
    }

    pub fn get_current_user_id(&self) -> Option<String> {
        self.identity.current_session().map(|s| s.user_id)
    }

    /// Like `get_current_user_id`, failing when nobody is signed in
    pub fn require_user_id(&self) -> Result<String> {
        self.get_current_user_id().ok_or(Error::NotAuthenticated)
    }

    /// Clear the local session; remote data is untouched
    pub fn logout(&self) -> Result<()> {
        self.identity.sign_out()
    }
}
