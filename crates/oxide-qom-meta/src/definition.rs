//! Introspected table and column definitions.

use oxide_qom::qom::{ColumnRef, DataType, Select, Table};
use oxide_qom::Field;
use serde::Serialize;

/// How a generated column is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationOption {
    /// Computed when read.
    Virtual,
    /// Computed when written and stored.
    Stored,
}

/// A column's declared type and constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataTypeDefinition {
    /// Type name without precision suffix or generation clause.
    pub type_name: String,
    /// Precision or length.
    pub precision: Option<u32>,
    /// Scale.
    pub scale: Option<u32>,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Default value expression text.
    pub default_value: Option<String>,
    /// Generation option for generated columns.
    pub generation: Option<GenerationOption>,
}

impl DataTypeDefinition {
    /// Resolves the declared type to a query object model type.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        DataType::from_declared(&self.type_name, self.precision, self.scale)
    }

    /// Returns whether the column is generated.
    #[must_use]
    pub const fn is_generated(&self) -> bool {
        self.generation.is_some()
    }
}

/// A column of a table or view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,
    /// 1-based position.
    pub position: usize,
    /// Declared type.
    pub data_type: DataTypeDefinition,
    /// Whether the column is an identity (auto-assigned rowid alias).
    pub identity: bool,
}

impl ColumnDefinition {
    /// Returns a column reference carrying the resolved data type.
    #[must_use]
    pub fn field(&self) -> Field {
        ColumnRef::new(None, &self.name)
            .with_data_type(self.data_type.data_type())
            .into()
    }
}

/// A table or view with its columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDefinition {
    name: String,
    columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    /// Creates a definition.
    #[must_use]
    pub fn new(name: &str, columns: Vec<ColumnDefinition>) -> Self {
        Self {
            name: name.to_string(),
            columns,
        }
    }

    /// The table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The columns in position order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Looks up a column, ignoring ASCII case as SQLite does.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Returns the typed field for a column.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Field> {
        self.column(name).map(ColumnDefinition::field)
    }

    /// Returns the identity column, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.identity)
    }

    /// `SELECT` of every column, in position order.
    #[must_use]
    pub fn select_all(&self) -> Select {
        Select::new(self.columns.iter().map(ColumnDefinition::field)).from(Table::named(&self.name))
    }
}
