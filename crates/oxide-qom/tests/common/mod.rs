//! Common test utilities for oxide-qom integration tests.

#![allow(dead_code)]

use oxide_qom::render::{QueryPart, Renderer};
use oxide_qom::scope::ScopeStack;
use oxide_qom::{Dialect, Rendered, SqlValue};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqlitePoolOptions};
use sqlx::Sqlite;

/// Renders a part for `dialect`, panicking with the dialect name on failure.
pub fn render<P: QueryPart + ?Sized>(dialect: Dialect, part: &P) -> Rendered {
    match Renderer::new(dialect).render(part) {
        Ok(rendered) => rendered,
        Err(e) => panic!("rendering for {dialect} failed: {e}"),
    }
}

/// Renders a part for `dialect` with every value inlined.
pub fn render_inlined<P: QueryPart + ?Sized>(dialect: Dialect, part: &P) -> String {
    match Renderer::new(dialect).render_inlined(part) {
        Ok(sql) => sql,
        Err(e) => panic!("inlined rendering for {dialect} failed: {e}"),
    }
}

/// Opens a single-connection in-memory SQLite database.
pub async fn sqlite_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool")
}

/// Creates `pairs(id, a, b)` and fills it with the given rows.
pub async fn pairs_table(pool: &SqlitePool, rows: &[(Option<i64>, Option<i64>)]) {
    sqlx::query("CREATE TABLE pairs (id INTEGER PRIMARY KEY, a INTEGER, b INTEGER)")
        .execute(pool)
        .await
        .expect("Failed to create pairs table");
    for (a, b) in rows {
        sqlx::query("INSERT INTO pairs (a, b) VALUES (?, ?)")
            .bind(*a)
            .bind(*b)
            .execute(pool)
            .await
            .expect("Failed to insert pair");
    }
}

/// Attaches rendered binds to a SQLite query in placeholder order.
pub fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    binds: &'q [SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in binds {
        query = match value {
            SqlValue::Null => query.bind(None::<i64>),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.as_str()),
            SqlValue::Blob(b) => query.bind(b.as_slice()),
        };
    }
    query
}

/// Asserts that no key in `stack` holds more slots than the current level
/// allows.
pub fn assert_slot_bound<V>(stack: &ScopeStack<String, V>, keys: &[&str]) {
    let limit = stack.scope_level().map_or(0, |level| level + 1);
    for key in keys {
        let slots = stack.slot_count(*key);
        assert!(
            slots <= limit,
            "key {key} holds {slots} slots at level {:?}",
            stack.scope_level()
        );
    }
}
