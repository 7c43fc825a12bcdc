//! Error types for rendering and graph traversal.

use crate::dialect::Dialect;

/// Errors that can occur while rendering a query part.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// A construct has neither a native nor an emulated rendering for the
    /// active dialect.
    #[error("{construct} is not supported by dialect {dialect}")]
    Unsupported {
        /// The construct that could not be rendered.
        construct: &'static str,
        /// The dialect being rendered.
        dialect: Dialect,
    },

    /// A nested common table expression shadows an outer one and the dialect
    /// requires all CTEs at the top level.
    #[error("common table expression '{name}' shadows an outer declaration and cannot be moved to the top level for dialect {dialect}")]
    CteShadowing {
        /// The shadowing CTE name.
        name: String,
        /// The dialect being rendered.
        dialect: Dialect,
    },

    /// The same CTE name is declared twice in one WITH clause.
    #[error("common table expression '{0}' is declared more than once in the same WITH clause")]
    DuplicateCte(String),

    /// A raw SQL template references a substitute that was not supplied.
    #[error("template placeholder {{{index}}} has no substitute ({available} supplied)")]
    TemplateIndex {
        /// The referenced substitute index.
        index: usize,
        /// The number of substitutes supplied.
        available: usize,
    },
}

impl RenderError {
    /// Creates an unsupported-construct error.
    #[must_use]
    pub const fn unsupported(construct: &'static str, dialect: Dialect) -> Self {
        Self::Unsupported { construct, dialect }
    }
}

/// Errors that can occur while walking a version graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The two nodes share no ancestor.
    #[error("versions {left} and {right} do not have a common ancestor")]
    Unrelated {
        /// Identifier of the first node.
        left: String,
        /// Identifier of the second node.
        right: String,
    },

    /// A node index does not belong to this graph.
    #[error("node index {0} does not exist in this graph")]
    UnknownNode(usize),

    /// A node with the same identifier already exists.
    #[error("a version with id '{0}' already exists")]
    DuplicateId(String),
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;
