//! In-memory adapters
//!
//! Used by the `memory` backend and by tests. Both count the calls they
//! receive and can be told to fail, which lets tests assert that validation
//! happens before any remote call and exercise the failure paths.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::session::SessionStore;
use crate::domain::result::{Error, IdentityError, Result};
use crate::domain::validation::is_valid_email;
use crate::domain::Document;
use crate::ports::{AuthSession, DocumentStore, IdentityProvider};

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    m.lock().map_err(|e| Error::store(format!("lock poisoned: {e}")))
}

/// Identity accounts held in a map of email to (user id, password)
pub struct InMemoryIdentityProvider {
    accounts: Mutex<HashMap<String, (String, String)>>,
    session: SessionStore,
    calls: AtomicUsize,
    offline: AtomicBool,
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            session: SessionStore::in_memory(),
            calls: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
        }
    }

    /// Number of `create_user`/`sign_in` calls received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every remote call fail with a network error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn begin_call(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(IdentityError::Network("network unavailable".into()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.begin_call()?;
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(IdentityError::InvalidEmail.into());
        }
        if password.chars().count() < 6 {
            return Err(IdentityError::WeakPassword.into());
        }

        let user_id = {
            let mut accounts = lock(&self.accounts)?;
            if accounts.contains_key(&email) {
                return Err(IdentityError::EmailInUse.into());
            }
            let user_id = Uuid::new_v4().simple().to_string();
            accounts.insert(email.clone(), (user_id.clone(), password.to_string()));
            user_id
        };

        let session = AuthSession::local(user_id, email);
        self.session.save(&session)?;
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.begin_call()?;
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(IdentityError::InvalidEmail.into());
        }

        let user_id = {
            let accounts = lock(&self.accounts)?;
            let (user_id, stored) = accounts
                .get(&email)
                .ok_or(Error::Identity(IdentityError::UnknownAccount))?;
            if stored != password {
                return Err(IdentityError::InvalidCredentials.into());
            }
            user_id.clone()
        };

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

/// Documents held in ordered maps, one per collection
#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: Mutex<HashMap<String, BTreeMap<String, Document>>>,
    failing_collections: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store operations received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make writes to `collection` fail with a store error
    pub fn fail_writes_to(&self, collection: &str) {
        if let Ok(mut failing) = self.failing_collections.lock() {
            failing.insert(collection.to_string());
        }
    }

    /// Insert a raw document, bypassing failure injection
    pub fn insert_raw(&self, collection: &str, id: &str, data: Document) {
        if let Ok(mut collections) = self.collections.lock() {
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), data);
        }
    }

    fn begin_write(&self, collection: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if lock(&self.failing_collections)?.contains(collection) {
            return Err(Error::store(format!("write to {collection} rejected")));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn set(&self, collection: &str, id: &str, data: Document) -> Result<()> {
        self.begin_write(collection)?;
        lock(&self.collections)?
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.collections)?
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn update(&self, collection: &str, id: &str, fields: Document) -> Result<()> {
        self.begin_write(collection)?;
        let mut collections = lock(&self.collections)?;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| Error::not_found(format!("{collection}/{id}")))?;
        doc.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.begin_write(collection)?;
        if let Some(docs) = lock(&self.collections)?.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn query_eq(&self, collection: &str, field: &str, value: &Value) -> Result<Vec<Document>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.collections)?
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| doc.get(field) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_offline_identity_fails_with_network_error() {
        let identity = InMemoryIdentityProvider::new();
        identity.set_offline(true);

        let result = identity.sign_in("ana@example.com", "Secret1").await;
        assert!(matches!(result, Err(Error::Identity(IdentityError::Network(_)))));
        assert_eq!(identity.calls(), 1);
    }

    #[tokio::test]
    async fn test_failing_collection_only_affects_writes_there() {
        let store = InMemoryDocumentStore::new();
        store.fail_writes_to("Users");

        let doc = json!({"id": "x"}).as_object().cloned().unwrap();
        assert!(store.set("Users", "x", doc.clone()).await.is_err());
        assert!(store.set("Tasks", "x", doc).await.is_ok());
        assert_eq!(store.calls(), 2);
    }
}
