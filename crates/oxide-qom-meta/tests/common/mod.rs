//! Common test utilities for oxide-qom-meta integration tests.

#![allow(dead_code)]

use std::time::Duration;

use oxide_qom_meta::{ReadOptions, SqliteCatalog, SqliteTableReader};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Opens a single-connection in-memory SQLite database and runs `statements`.
pub async fn database(statements: &[&str]) -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");
    for statement in statements {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .unwrap_or_else(|e| panic!("Failed to run '{statement}': {e}"));
    }
    pool
}

/// Creates a reader with a short timeout.
pub fn reader(pool: &SqlitePool) -> SqliteTableReader {
    SqliteTableReader::new(
        SqliteCatalog::new(pool.clone()),
        ReadOptions::default().with_timeout(Duration::from_secs(5)),
    )
}
