//! Column definitions for SQLite tables and views.
//!
//! Declared types come from `pragma_table_xinfo`. Where SQLite reports no
//! usable type, the table's creation statement is interpreted instead
//! (once per table; the result is cached on the reader). Identity columns are
//! detected from `sqlite_sequence`, falling back to the `AUTOINCREMENT` token
//! for tables that have never held a row.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};
use std::time::Duration;

use regex::Regex;
use tracing::{debug, info};

use crate::catalog::{SqliteCatalog, XInfoRow};
use crate::ddl::{self, InterpretedTable};
use crate::definition::{ColumnDefinition, DataTypeDefinition, GenerationOption, TableDefinition};
use crate::error::{MetaError, Result};

static PRECISION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\s*(\d+)\s*(?:,\s*(\d+)\s*)?\)").expect("valid precision suffix regex")
});

static GENERATED_ALWAYS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*generated\s+always\s*").expect("valid GENERATED ALWAYS regex")
});

/// Options for reading metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Upper bound for reading one table's columns.
    pub timeout: Duration,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl ReadOptions {
    /// Sets the timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Table-level facts that decide whether a primary key is an identity.
#[derive(Debug, Clone, Copy, Default)]
struct IdentityFacts {
    without_rowid: bool,
    in_sequence: bool,
    empty: bool,
}

/// Reads column definitions through a [`SqliteCatalog`].
#[derive(Debug)]
pub struct SqliteTableReader {
    catalog: SqliteCatalog,
    options: ReadOptions,
    interpretations: Mutex<HashMap<String, Option<Arc<InterpretedTable>>>>,
}

impl SqliteTableReader {
    /// Creates a reader.
    #[must_use]
    pub fn new(catalog: SqliteCatalog, options: ReadOptions) -> Self {
        Self {
            catalog,
            options,
            interpretations: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the catalog.
    #[must_use]
    pub const fn catalog(&self) -> &SqliteCatalog {
        &self.catalog
    }

    /// Returns the read options.
    #[must_use]
    pub const fn options(&self) -> ReadOptions {
        self.options
    }

    /// Reads the columns of `table`, in position order.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::TableNotFound`] for unknown tables,
    /// [`MetaError::Timeout`] when the read exceeds
    /// [`ReadOptions::timeout`], and [`MetaError::Database`] for query
    /// failures. Creation statements that cannot be interpreted never fail
    /// the read; the affected columns get an unknown type.
    pub async fn columns(&self, table: &str) -> Result<Vec<ColumnDefinition>> {
        let timeout = self.options.timeout;
        tokio::time::timeout(timeout, self.read_columns(table))
            .await
            .map_err(|_| MetaError::Timeout {
                table: table.to_string(),
                timeout,
            })?
    }

    /// Reads `table` with its columns.
    ///
    /// # Errors
    ///
    /// See [`columns`](Self::columns).
    pub async fn table(&self, table: &str) -> Result<TableDefinition> {
        let columns = self.columns(table).await?;
        Ok(TableDefinition::new(table, columns))
    }

    async fn read_columns(&self, table: &str) -> Result<Vec<ColumnDefinition>> {
        let source = self.catalog.table_source(table).await?;
        let rows = self.catalog.table_xinfo(table).await?;
        let facts = if rows.iter().any(|row| row.pk > 0) {
            self.identity_facts(table, &source).await?
        } else {
            IdentityFacts::default()
        };

        let columns = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| self.column(table, &source, row, i + 1, facts))
            .collect::<Vec<_>>();
        debug!(table, columns = columns.len(), "Read column definitions");
        Ok(columns)
    }

    async fn identity_facts(&self, table: &str, source: &str) -> Result<IdentityFacts> {
        if ddl::is_without_rowid(source) {
            return Ok(IdentityFacts {
                without_rowid: true,
                ..IdentityFacts::default()
            });
        }
        let in_sequence = self.catalog.sqlite_sequence_exists().await?
            && self.catalog.has_sequence_entry(table).await?;
        let empty = !in_sequence && self.catalog.is_empty(table).await?;
        Ok(IdentityFacts {
            without_rowid: false,
            in_sequence,
            empty,
        })
    }

    fn column(
        &self,
        table: &str,
        source: &str,
        row: XInfoRow,
        position: usize,
        facts: IdentityFacts,
    ) -> ColumnDefinition {
        let mut type_name = PRECISION_SUFFIX
            .replace_all(&row.declared_type, "")
            .trim()
            .to_string();
        let (mut precision, mut scale) = parse_precision(&row.declared_type);

        if type_name.is_empty() || type_name.eq_ignore_ascii_case("other") {
            let declared = self.interpretation(table, source);
            if let Some(column) = declared.as_ref().and_then(|t| t.column(&row.name)) {
                debug!(table, column = %row.name, type_name = %column.type_name, "Recovered type from source");
                type_name.clone_from(&column.type_name);
                precision = column.precision;
                scale = column.scale;
            }
        }

        let generation = match row.hidden {
            2 => Some(GenerationOption::Virtual),
            3 => Some(GenerationOption::Stored),
            _ => None,
        };
        if generation.is_some() {
            type_name = GENERATED_ALWAYS.replace_all(&type_name, "").trim().to_string();
        }

        let identity = row.pk > 0
            && !facts.without_rowid
            && (facts.in_sequence || (facts.empty && self.is_autoincrement(table, source, &row.name)));

        ColumnDefinition {
            name: row.name,
            position,
            data_type: DataTypeDefinition {
                type_name,
                precision,
                scale,
                nullable: !row.not_null,
                default_value: row.default_value,
                generation,
            },
            identity,
        }
    }

    fn is_autoincrement(&self, table: &str, source: &str, column: &str) -> bool {
        self.interpretation(table, source).map_or_else(
            || {
                source
                    .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .any(|word| word.eq_ignore_ascii_case("AUTOINCREMENT"))
            },
            |interpreted| {
                interpreted
                    .column(column)
                    .is_some_and(ddl::DeclaredColumn::is_autoincrement)
            },
        )
    }

    /// Interprets the creation statement of `table`, at most once per reader.
    fn interpretation(&self, table: &str, source: &str) -> Option<Arc<InterpretedTable>> {
        self.interpretations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(table.to_string())
            .or_insert_with(|| match ddl::interpret(source) {
                Ok(interpreted) => Some(Arc::new(interpreted)),
                Err(e) => {
                    info!(table, source, error = %e, "Falling back to unknown column types");
                    None
                }
            })
            .clone()
    }
}

/// Parses `p` and `s` from a `TYPE(p[, s])` declaration.
fn parse_precision(declared_type: &str) -> (Option<u32>, Option<u32>) {
    PRECISION_SUFFIX
        .captures(declared_type)
        .map_or((None, None), |c| {
            (
                c.get(1).and_then(|m| m.as_str().parse().ok()),
                c.get(2).and_then(|m| m.as_str().parse().ok()),
            )
        })
}
