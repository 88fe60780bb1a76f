//! Database Module
//!
//! Embedded SurrealDB (RocksDB backend) plus the uniqueness indexes the
//! data model relies on.

pub mod models;
pub mod repository;

use std::path::Path;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

use crate::utils::AppError;

const NAMESPACE: &str = "purestore";
const DATABASE: &str = "storefront";

/// Database service, owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the embedded database at `db_path` and apply schema
    pub async fn new(db_path: &Path) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        define_schema(&db).await?;

        tracing::info!(path = %db_path.display(), "Database connection established");

        Ok(Self { db })
    }
}

/// Declare the unique indexes the model invariants depend on:
/// user email, product slug, order number, and the one-review-per-user
/// (product, user) pair.
async fn define_schema(db: &Surreal<Db>) -> Result<(), AppError> {
    // Note: the orders table is named "orders" because the bare word
    // "order" collides with SurrealQL's ORDER keyword.
    const SCHEMA: &str = "
        DEFINE TABLE IF NOT EXISTS user SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS user_email ON TABLE user COLUMNS email UNIQUE;

        DEFINE TABLE IF NOT EXISTS product SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS product_slug ON TABLE product COLUMNS slug UNIQUE;

        DEFINE TABLE IF NOT EXISTS orders SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS orders_number ON TABLE orders COLUMNS order_number UNIQUE;

        DEFINE TABLE IF NOT EXISTS review SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS review_product_user ON TABLE review COLUMNS product, user UNIQUE;
    ";

    db.query(SCHEMA)
        .await
        .map_err(|e| AppError::database(format!("Failed to apply schema: {e}")))?
        .check()
        .map_err(|e| AppError::database(format!("Schema statement failed: {e}")))?;

    tracing::info!("Database schema applied");
    Ok(())
}
