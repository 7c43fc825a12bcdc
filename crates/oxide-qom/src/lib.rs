//! # oxide-qom
//!
//! Dialect-aware SQL rendering over an immutable query object model.
//!
//! This crate provides:
//! - A closed query object model ([`qom`]) of fields, conditions, tables and
//!   selects that own their children and compare structurally
//! - A render protocol ([`render`]) in which every node writes itself into a
//!   per-pass [`RenderContext`](render::RenderContext)
//! - Per-dialect emulation decisions ([`emulation`]) for constructs that a
//!   target database lacks
//! - A multi-level [`ScopeStack`](scope::ScopeStack) for render-time scoping
//! - A lowest-common-ancestor walker over version graphs ([`graph`])
//!
//! ## Rendering for a dialect
//!
//! The same tree renders differently depending on the target:
//!
//! ```rust
//! use oxide_qom::dialect::Dialect;
//! use oxide_qom::qom::{col, greatest, Select, Table};
//! use oxide_qom::render::Renderer;
//!
//! let select = Select::new([greatest([col("a"), col("b")]).alias("g")])
//!     .from(Table::named("t"));
//!
//! let pg = Renderer::new(Dialect::Postgres16).render(&select).unwrap();
//! assert_eq!(pg.sql, "SELECT GREATEST(a, b) AS g FROM t");
//!
//! let sqlite = Renderer::new(Dialect::Sqlite).render(&select).unwrap();
//! assert_eq!(sqlite.sql, "SELECT MAX(a, b) AS g FROM t");
//! ```
//!
//! ## Unsupported constructs
//!
//! When neither native support nor an emulation exists, rendering fails with
//! the construct and dialect named:
//!
//! ```rust
//! use oxide_qom::dialect::Dialect;
//! use oxide_qom::qom::col;
//! use oxide_qom::render::Renderer;
//! use oxide_qom::RenderError;
//!
//! let err = Renderer::new(Dialect::Derby).render(&!col("flags")).unwrap_err();
//! assert_eq!(err, RenderError::unsupported("bitwise NOT", Dialect::Derby));
//! ```

pub mod dialect;
pub mod emulation;
mod error;
pub mod graph;
pub mod qom;
pub mod render;
pub mod scope;
pub mod value;

pub use dialect::{Dialect, Family};
pub use error::{GraphError, RenderError, Result};
pub use qom::{Condition, Field, Select, Table};
pub use render::{QueryPart, Rendered, Renderer, Settings};
pub use value::{SqlValue, ToSqlValue};
