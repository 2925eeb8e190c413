//! Local identity provider
//!
//! Email/password accounts stored in the local DuckDB file. Passwords are
//! hashed with Argon2id and a random per-account salt. Error semantics mirror
//! the remote identity service so the rest of the app cannot tell them apart.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use duckdb::params;
use rand::Rng;
use uuid::Uuid;

use super::duckdb::LocalDatabase;
use super::session::SessionStore;
use crate::domain::result::{Error, IdentityError, Result};
use crate::domain::validation::is_valid_email;
use crate::ports::{AuthSession, IdentityProvider};

const TIME_COST: u32 = 2;
const MEMORY_COST: u32 = 19_456; // 19 MiB
const PARALLELISM: u32 = 1;
const HASH_LEN: usize = 32;
const SALT_LEN: usize = 16;
const MIN_PASSWORD_LEN: usize = 6;

/// Identity accounts kept in `sys_identities`
pub struct LocalIdentityProvider {
    db: Arc<LocalDatabase>,
    session: Arc<SessionStore>,
}

impl LocalIdentityProvider {
    pub fn new(db: Arc<LocalDatabase>, session: Arc<SessionStore>) -> Self {
        Self { db, session }
    }

    fn hash_password(password: &str, salt: &[u8]) -> Result<String> {
        let params = argon2::Params::new(MEMORY_COST, TIME_COST, PARALLELISM, Some(HASH_LEN))
            .map_err(|e| IdentityError::Other(format!("argon2 params: {e:?}")))?;
        let argon2 = argon2::Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

        let mut hash = vec![0u8; HASH_LEN];
        argon2
            .hash_password_into(password.as_bytes(), salt, &mut hash)
            .map_err(|e| IdentityError::Other(format!("password hashing failed: {e:?}")))?;
        Ok(hex::encode(hash))
    }

    fn find_account(&self, email: &str) -> Result<Option<(String, String, String)>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, password_salt, password_hash FROM sys_identities WHERE email = ?",
        )?;
        let mut rows = stmt.query([email])?;
        let account: Option<(String, String, String)> = match rows.next()? {
            Some(row) => Some((row.get(0)?, row.get(1)?, row.get(2)?)),
            None => None,
        };
        Ok(account)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(IdentityError::InvalidEmail.into());
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::WeakPassword.into());
        }
        if self.find_account(&email)?.is_some() {
            return Err(IdentityError::EmailInUse.into());
        }

        let salt: [u8; SALT_LEN] = rand::thread_rng().gen();
        let salt_b64 = base64::engine::general_purpose::STANDARD.encode(salt);
        let hash = Self::hash_password(password, &salt)?;
        let user_id = Uuid::new_v4().simple().to_string();

        {
            let conn = self.db.lock()?;
            conn.execute(
                "INSERT INTO sys_identities (user_id, email, password_salt, password_hash, created_at)
                 VALUES (?, ?, ?, ?, ?)",
                params![user_id, email, salt_b64, hash, Utc::now().timestamp_millis()],
            )?;
        }

        let session = AuthSession::local(user_id, email);
        self.session.save(&session)?;
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(IdentityError::InvalidEmail.into());
        }

        let (user_id, salt_b64, expected) = self
            .find_account(&email)?
            .ok_or(Error::Identity(IdentityError::UnknownAccount))?;
        let salt = base64::engine::general_purpose::STANDARD
            .decode(&salt_b64)
            .map_err(|e| IdentityError::Other(format!("corrupt salt for account: {e}")))?;

        if Self::hash_password(password, &salt)? != expected {
            return Err(IdentityError::InvalidCredentials.into());
        }

        let session = AuthSession::local(user_id, email);
        self.session.save(&session)?;
        Ok(session)
    }

    fn current_session(&self) -> Option<AuthSession> {
        self.session.load()
    }

    fn sign_out(&self) -> Result<()> {
        self.session.clear()
    }
}
