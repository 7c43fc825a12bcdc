//! Rendering query parts to SQL.
//!
//! # Example
//!
//! ```rust
//! use oxide_qom::dialect::Dialect;
//! use oxide_qom::qom::{col, val, Select, Table};
//! use oxide_qom::render::Renderer;
//!
//! let select = Select::new([col("id"), col("name")])
//!     .from(Table::named("users"))
//!     .where_clause(col("id").eq(val(42)));
//!
//! let rendered = Renderer::new(Dialect::Postgres16).render(&select).unwrap();
//! assert_eq!(rendered.sql, "SELECT id, name FROM users WHERE id = $1");
//! assert_eq!(rendered.binds.len(), 1);
//! ```

mod context;
pub(crate) mod cte;
mod settings;

use core::fmt;

use tracing::debug;

use crate::dialect::Dialect;
use crate::error::Result;
use crate::value::SqlValue;

pub use context::{DataKey, DataValue, Declaration, Inherit, RenderContext, RenderFlags};
pub use settings::{ParamType, RenderQuotedNames, Settings};

/// A node that can render itself into a [`RenderContext`].
///
/// Rendering is deterministic: the same part rendered for the same dialect and
/// settings yields byte-identical SQL and the same bind order.
pub trait QueryPart {
    /// Renders this part.
    ///
    /// # Errors
    ///
    /// Fails when the part, or one of its children, cannot be expressed in
    /// the context's dialect.
    fn accept(&self, ctx: &mut RenderContext) -> Result<()>;
}

impl<T: QueryPart + ?Sized> QueryPart for &T {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        (**self).accept(ctx)
    }
}

impl<T: QueryPart + ?Sized> QueryPart for Box<T> {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        (**self).accept(ctx)
    }
}

/// Rendered SQL and its binds, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    /// The SQL text.
    pub sql: String,
    /// The bind values, one per placeholder.
    pub binds: Vec<SqlValue>,
}

impl Rendered {
    /// Splits into SQL text and binds.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.binds)
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Renders query parts for one dialect and set of settings.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    dialect: Dialect,
    settings: Settings,
}

impl Renderer {
    /// Creates a renderer with default settings.
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            settings: Settings::default(),
        }
    }

    /// Creates a renderer with explicit settings.
    #[must_use]
    pub const fn with_settings(dialect: Dialect, settings: Settings) -> Self {
        Self { dialect, settings }
    }

    /// Returns the target dialect.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Returns the settings.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Renders a part to SQL with binds.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`](crate::RenderError) when the part cannot be
    /// expressed in the dialect.
    pub fn render<P: QueryPart + ?Sized>(&self, part: &P) -> Result<Rendered> {
        let mut ctx = RenderContext::new(self.dialect, self.settings.clone());
        part.accept(&mut ctx)?;
        let rendered = ctx.finish();
        debug!(
            dialect = %self.dialect,
            sql = %rendered.sql,
            binds = rendered.binds.len(),
            "Rendered query part"
        );
        Ok(rendered)
    }

    /// Renders a part with every value inlined.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`](crate::RenderError) when the part cannot be
    /// expressed in the dialect.
    pub fn render_inlined<P: QueryPart + ?Sized>(&self, part: &P) -> Result<String> {
        let settings = self.settings.clone().with_param_type(ParamType::Inlined);
        let renderer = Self::with_settings(self.dialect, settings);
        Ok(renderer.render(part)?.sql)
    }
}
