//! Document store port - schemaless collection/document storage

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::Value;

use crate::domain::result::Result;
use crate::domain::Document;

/// Length of generated document ids
const DOCUMENT_ID_LEN: usize = 20;

/// Generate a random 20 character alphanumeric document id
pub fn generate_document_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(DOCUMENT_ID_LEN)
        .map(char::from)
        .collect()
}

/// Document store abstraction
///
/// Documents are addressed by collection and id. Concurrent writes to the
/// same document are serialised by the store; the last write wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Allocate an id for a new document
    fn new_id(&self) -> String {
        generate_document_id()
    }

    /// Create or overwrite a document
    async fn set(&self, collection: &str, id: &str, data: Document) -> Result<()>;

    /// Fetch a document, `None` if it does not exist
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Merge `fields` into an existing document
    ///
    /// Fails with `Error::NotFound` if the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Document) -> Result<()>;

    /// Delete a document; deleting a missing document succeeds
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// All documents in `collection` whose `field` equals `value`
    async fn query_eq(&self, collection: &str, field: &str, value: &Value) -> Result<Vec<Document>>;
}
