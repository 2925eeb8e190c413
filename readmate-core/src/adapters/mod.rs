//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the DocumentStore port and local identities
//! - Firebase REST (Identity Toolkit + Firestore) for the remote backend
//! - Local filesystem for FileStore
//! - In-memory maps for tests and the `memory` backend

pub mod duckdb;
pub mod firebase;
pub mod local_files;
pub mod local_identity;
pub mod memory;
pub mod session;
