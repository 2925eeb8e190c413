//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external collaborators: the identity
//! service, the document store and the local file store. Services depend
//! only on these traits, never on a concrete adapter.

mod document_store;
mod file_store;
mod identity;

pub use document_store::{generate_document_id, DocumentStore};
pub use file_store::FileStore;
pub use identity::{AuthSession, IdentityProvider};

pub use crate::domain::Document;
