//! Repository Module
//!
//! CRUD operations over the SurrealDB tables. Handlers and the order
//! workflow go through repositories; raw queries never leak above this
//! layer.

pub mod order;
pub mod product;
pub mod review;
pub mod user;

pub use order::OrderRepository;
pub use product::ProductRepository;
pub use review::ReviewRepository;
pub use user::UserRepository;

use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        // Unique index violations surface as index errors; report them as
        // duplicates so callers can answer 409 instead of 500
        if msg.contains("already contains") || msg.contains("unique") {
            RepoError::Duplicate(msg)
        } else {
            RepoError::Database(msg)
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

/// Parse an id that may or may not carry its "table:" prefix into a RecordId
pub fn parse_record_id(table: &str, id: &str) -> RecordId {
    let key = id.strip_prefix(&format!("{}:", table)).unwrap_or(id);
    RecordId::from_table_key(table, key)
}

/// Row shape for `SELECT count() ... GROUP ALL`
#[derive(Debug, serde::Deserialize)]
pub(crate) struct CountRow {
    pub count: i64,
}

/// Current time as an RFC3339 string, the stored timestamp format
pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_id_strips_prefix() {
        let a = parse_record_id("product", "product:abc123");
        let b = parse_record_id("product", "abc123");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "product:abc123");
    }
}
