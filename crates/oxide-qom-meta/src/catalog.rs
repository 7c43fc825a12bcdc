//! Raw catalog queries against a SQLite database.

use oxide_qom::qom::{inline, Select, Table};
use oxide_qom::render::{RenderQuotedNames, Renderer, Settings};
use oxide_qom::Dialect;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

use crate::error::{MetaError, Result};

/// Selects the visible and generated columns of a table or view.
///
/// Hidden values: 0 = ordinary column, 2 = generated (virtual),
/// 3 = generated (stored). Hidden columns of virtual tables (1) are skipped.
const TABLE_XINFO_SQL: &str = r#"
SELECT name, type, "notnull", dflt_value, pk, hidden
FROM pragma_table_xinfo(?)
WHERE hidden IN (0, 2, 3)
ORDER BY cid
"#;

/// One row of `pragma_table_xinfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XInfoRow {
    /// Column name.
    pub name: String,
    /// Declared type, as written in the DDL (may be empty).
    pub declared_type: String,
    /// Whether the column has a NOT NULL constraint.
    pub not_null: bool,
    /// Default value expression text.
    pub default_value: Option<String>,
    /// 1-based position within the primary key, or 0.
    pub pk: i64,
    /// Hidden classification.
    pub hidden: i64,
}

/// Catalog access for a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Creates a catalog over a connection pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Lists user tables and views, by name.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::Database`] if the query fails.
    pub async fn tables(&self) -> Result<Vec<String>> {
        debug!("Listing tables from sqlite_master");
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master \
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Reads the column rows of `table`.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::Database`] if the query fails.
    pub async fn table_xinfo(&self, table: &str) -> Result<Vec<XInfoRow>> {
        debug!(table, "Reading pragma_table_xinfo");
        let rows: Vec<(String, String, i64, Option<String>, i64, i64)> =
            sqlx::query_as(TABLE_XINFO_SQL)
                .bind(table)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(
                |(name, declared_type, not_null, default_value, pk, hidden)| XInfoRow {
                    name,
                    declared_type,
                    not_null: not_null != 0,
                    default_value,
                    pk,
                    hidden,
                },
            )
            .collect())
    }

    /// Returns the statement that created `table`.
    ///
    /// Fails when no table or view of that name exists. Tables created without source text yield an empty string.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::TableNotFound`] or [`MetaError::Database`].
    pub async fn table_source(&self, table: &str) -> Result<String> {
        debug!(table, "Reading source from sqlite_master");
        let row: Option<(Option<String>,)> = sqlx::query_as(
            "SELECT sql FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?",
        )
        .bind(table)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((sql,)) => Ok(sql.unwrap_or_default()),
            None => Err(MetaError::TableNotFound(table.to_string())),
        }
    }

    /// Returns whether the database has a `sqlite_sequence` table.
    ///
    /// SQLite creates it with the first `AUTOINCREMENT` table.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::Database`] if the query fails.
    pub async fn sqlite_sequence_exists(&self) -> Result<bool> {
        debug!("Checking for sqlite_sequence");
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'sqlite_sequence'",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    /// Returns whether `sqlite_sequence` holds an entry for `table`.
    ///
    /// Entries only appear once a row has been inserted.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::Database`] if the query fails.
    pub async fn has_sequence_entry(&self, table: &str) -> Result<bool> {
        debug!(table, "Reading sqlite_sequence");
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sqlite_sequence WHERE name = ?")
            .bind(table)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Returns whether `table` holds no rows.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::Database`] if the query fails.
    pub async fn is_empty(&self, table: &str) -> Result<bool> {
        let sql = probe_sql(table);
        debug!(table, sql = %sql, "Checking whether table is empty");
        let row: Option<(i64,)> = sqlx::query_as(&sql).fetch_optional(&self.pool).await?;
        Ok(row.is_none())
    }
}

/// `SELECT 1 FROM "table" LIMIT 1`, with the name always quoted.
fn probe_sql(table: &str) -> String {
    let settings = Settings::default().with_quoted_names(RenderQuotedNames::Always);
    let select = Select::new([inline(1)]).from(Table::named(table)).limit(1);
    Renderer::with_settings(Dialect::Sqlite, settings)
        .render(&select)
        .map_or_else(
            |_| format!("SELECT 1 FROM {} LIMIT 1", Dialect::Sqlite.quote_identifier(table)),
            |rendered| rendered.sql,
        )
}
