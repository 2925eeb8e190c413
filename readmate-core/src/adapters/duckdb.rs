//! DuckDB adapters for the local backend
//!
//! One `LocalDatabase` connection is shared by the document store and the
//! local identity provider; DuckDB does not allow two handles on the same
//! file from one process.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use duckdb::{params, Connection};
use serde_json::Value;

use crate::domain::result::{Error, Result};
use crate::domain::Document;
use crate::migrations::MIGRATIONS;
use crate::ports::DocumentStore;
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when the database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("could not set lock")
}

/// Shared DuckDB connection for the local backend
pub struct LocalDatabase {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl LocalDatabase {
    /// Open (or create) the database file, retrying while another process holds the lock
    pub fn open(db_path: &Path) -> Result<Self> {
        let mut attempt = 0;
        loop {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: Some(db_path.to_path_buf()),
                    })
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if !is_retryable_error(&err_msg) || attempt + 1 >= MAX_RETRIES {
                        return Err(Error::database(err_msg));
                    }
                    let delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                    eprintln!(
                        "[readmate] Database busy, retrying in {}ms (attempt {}/{}): {}",
                        delay.as_millis(),
                        attempt + 1,
                        MAX_RETRIES,
                        err_msg
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    fn try_open_connection(db_path: &Path) -> duckdb::Result<Connection> {
        // Extension autoloading stays off; json is linked statically
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Connection::open_with_flags(db_path, config)
    }

    /// Apply pending schema migrations
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.lock()?;
        MigrationService::new(&conn, MIGRATIONS)
            .run_pending()
            .map_err(|e| Error::database(format!("migration failed: {e}")))
    }

    /// Ensure the schema exists
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {e}")))
    }
}

/// Document store backed by the `sys_documents` table
pub struct DuckDbDocumentStore {
    db: Arc<LocalDatabase>,
}

impl DuckDbDocumentStore {
    pub fn new(db: Arc<LocalDatabase>) -> Self {
        Self { db }
    }

    fn read(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let conn = self.db.lock()?;
        let mut stmt = conn
            .prepare("SELECT data FROM sys_documents WHERE collection = ? AND document_id = ?")?;
        let mut rows = stmt.query(params![collection, id])?;
        let data: Option<String> = match rows.next()? {
            Some(row) => Some(row.get(0)?),
            None => None,
        };
        data.map(|d| parse_document(&d)).transpose()
    }

    fn write(&self, collection: &str, id: &str, data: &Document) -> Result<()> {
        let json = serde_json::to_string(data)?;
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO sys_documents (collection, document_id, data, updated_at)
             VALUES (?, ?, ?, ?)",
            params![collection, id, json, Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }
}

fn parse_document(data: &str) -> Result<Document> {
    match serde_json::from_str::<Value>(data)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::store(format!("stored document is not an object: {other}"))),
    }
}

#[async_trait]
impl DocumentStore for DuckDbDocumentStore {
    async fn set(&self, collection: &str, id: &str, data: Document) -> Result<()> {
        self.write(collection, id, &data)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.read(collection, id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Document) -> Result<()> {
        let mut doc = self
            .read(collection, id)?
            .ok_or_else(|| Error::not_found(format!("{collection}/{id}")))?;
        doc.extend(fields);
        self.write(collection, id, &doc)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let conn = self.db.lock()?;
        conn.execute(
            "DELETE FROM sys_documents WHERE collection = ? AND document_id = ?",
            params![collection, id],
        )?;
        Ok(())
    }

    async fn query_eq(&self, collection: &str, field: &str, value: &Value) -> Result<Vec<Document>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(
            "SELECT data FROM sys_documents WHERE collection = ? ORDER BY document_id",
        )?;
        let rows = stmt.query_map([collection], |row| row.get::<_, String>(0))?;

        let mut matches = Vec::new();
        for data in rows {
            let doc = parse_document(&data?)?;
            if doc.get(field) == Some(value) {
                matches.push(doc);
            }
        }
        Ok(matches)
    }
}
