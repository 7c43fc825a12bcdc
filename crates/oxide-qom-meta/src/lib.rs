//! # oxide-qom-meta
//!
//! Reads SQLite table and view definitions into typed
//! [`oxide_qom`] fields.
//!
//! Column types come from the catalog. When SQLite reports none, which is
//! common for view columns and untyped declarations, the creation statement
//! is interpreted to recover them. Primary keys that SQLite assigns
//! automatically are reported as identity columns.
//!
//! ```rust,no_run
//! use oxide_qom::{Dialect, Renderer};
//! use oxide_qom_meta::{ReadOptions, SqliteCatalog, SqliteTableReader};
//! use sqlx::sqlite::SqlitePoolOptions;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let pool = SqlitePoolOptions::new().connect("sqlite:app.db").await?;
//! let reader = SqliteTableReader::new(SqliteCatalog::new(pool), ReadOptions::default());
//!
//! let orders = reader.table("orders").await?;
//! let sql = Renderer::new(Dialect::Postgres16).render(&orders.select_all())?;
//! println!("{sql}");
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod ddl;
pub mod definition;
mod error;
pub mod reader;

pub use catalog::SqliteCatalog;
pub use definition::{ColumnDefinition, DataTypeDefinition, GenerationOption, TableDefinition};
pub use error::{MetaError, Result};
pub use reader::{ReadOptions, SqliteTableReader};
