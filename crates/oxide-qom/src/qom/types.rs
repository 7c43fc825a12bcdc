//! SQL data types carried by query object model nodes.

use core::fmt;

use crate::dialect::{Dialect, Family};

/// SQL data types.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DataType {
    // Integer types
    /// Small integer (2 bytes).
    SmallInt,
    /// Integer (4 bytes).
    Integer,
    /// Big integer (8 bytes).
    BigInt,

    // Floating point
    /// Real (4-byte float).
    Real,
    /// Double precision (8-byte float).
    Double,
    /// Decimal with precision and scale.
    Decimal {
        /// Total number of digits.
        precision: Option<u16>,
        /// Number of digits after decimal point.
        scale: Option<u16>,
    },

    // String types
    /// Fixed-length character string.
    Char(Option<u32>),
    /// Variable-length character string.
    Varchar(Option<u32>),
    /// Text (variable length, no limit).
    Text,

    /// Binary large object.
    Blob,

    // Date/time types
    /// Date.
    Date,
    /// Time.
    Time,
    /// Timestamp.
    Timestamp,

    /// Boolean.
    Boolean,
    /// JSON document.
    Json,
    /// XML document.
    Xml,

    /// A database-specific type, by name.
    Custom(String),
    /// Unknown type.
    #[default]
    Other,
}

impl DataType {
    /// Returns the SQL representation of the data type.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::SmallInt => String::from("SMALLINT"),
            Self::Integer => String::from("INTEGER"),
            Self::BigInt => String::from("BIGINT"),
            Self::Real => String::from("REAL"),
            Self::Double => String::from("DOUBLE PRECISION"),
            Self::Decimal { precision, scale } => match (precision, scale) {
                (Some(p), Some(s)) => format!("DECIMAL({p}, {s})"),
                (Some(p), None) => format!("DECIMAL({p})"),
                _ => String::from("DECIMAL"),
            },
            Self::Char(len) => match len {
                Some(n) => format!("CHAR({n})"),
                None => String::from("CHAR"),
            },
            Self::Varchar(len) => match len {
                Some(n) => format!("VARCHAR({n})"),
                None => String::from("VARCHAR"),
            },
            Self::Text => String::from("TEXT"),
            Self::Blob => String::from("BLOB"),
            Self::Date => String::from("DATE"),
            Self::Time => String::from("TIME"),
            Self::Timestamp => String::from("TIMESTAMP"),
            Self::Boolean => String::from("BOOLEAN"),
            Self::Json => String::from("JSON"),
            Self::Xml => String::from("XML"),
            Self::Custom(name) => name.clone(),
            Self::Other => String::from("OTHER"),
        }
    }

    /// Returns the type name to use as a `CAST` target in `dialect`.
    #[must_use]
    pub fn cast_target(&self, dialect: Dialect) -> String {
        match (dialect.family(), self) {
            (
                Family::MySql | Family::MariaDb,
                Self::SmallInt | Self::Integer | Self::BigInt | Self::Boolean,
            ) => String::from("SIGNED"),
            (Family::MySql | Family::MariaDb, Self::Char(_) | Self::Varchar(_) | Self::Text) => {
                String::from("CHAR")
            }
            (Family::MySql | Family::MariaDb, Self::Real | Self::Double) => String::from("DOUBLE"),
            (Family::Sqlite, Self::Double) => String::from("REAL"),
            (Family::Postgres | Family::YugabyteDb, Self::Blob) => String::from("BYTEA"),
            (Family::Postgres | Family::YugabyteDb, Self::Json) => String::from("JSONB"),
            _ => self.to_sql(),
        }
    }

    /// Resolves a declared type name (as found in DDL or catalog metadata)
    /// to a data type. Unrecognised names become [`DataType::Custom`].
    #[must_use]
    pub fn from_declared(name: &str, precision: Option<u32>, scale: Option<u32>) -> Self {
        let upper = name.trim().to_ascii_uppercase();
        let narrow = |v: Option<u32>| v.and_then(|v| u16::try_from(v).ok());
        match upper.as_str() {
            "" | "OTHER" => Self::Other,
            "SMALLINT" | "INT2" | "TINYINT" => Self::SmallInt,
            "INT" | "INTEGER" | "INT4" | "MEDIUMINT" => Self::Integer,
            "BIGINT" | "INT8" => Self::BigInt,
            "REAL" | "FLOAT" | "FLOAT4" => Self::Real,
            "DOUBLE" | "DOUBLE PRECISION" | "FLOAT8" => Self::Double,
            "DECIMAL" | "NUMERIC" => Self::Decimal {
                precision: narrow(precision),
                scale: narrow(scale),
            },
            "CHAR" | "CHARACTER" | "NCHAR" => Self::Char(precision),
            "VARCHAR" | "CHARACTER VARYING" | "NVARCHAR" | "VARYING CHARACTER" => {
                Self::Varchar(precision)
            }
            "TEXT" | "CLOB" => Self::Text,
            "BLOB" | "BYTEA" | "BINARY" | "VARBINARY" => Self::Blob,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "TIMESTAMP" | "DATETIME" => Self::Timestamp,
            "BOOLEAN" | "BOOL" => Self::Boolean,
            "JSON" | "JSONB" => Self::Json,
            "XML" => Self::Xml,
            _ => Self::Custom(name.trim().to_string()),
        }
    }

    /// Returns whether this is the boolean type.
    #[must_use]
    pub const fn is_boolean(&self) -> bool {
        matches!(self, Self::Boolean)
    }

    /// Returns whether the type is known.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
