//! SQL values and bind parameter handling.
//!
//! Values reach the output either as placeholders (collected in order into the
//! bind list) or inlined as escaped literals, depending on
//! [`ParamType`](crate::render::ParamType).

use crate::dialect::{Dialect, Family};
use crate::emulation::{self, BooleanLiteral};
use crate::qom::DataType;

/// A SQL value that can be bound or inlined.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns the SQL literal for this value in the given dialect.
    ///
    /// **Warning**: Prefer bind values for anything that originates from user input.
    #[must_use]
    pub fn to_sql_inline(&self, dialect: Dialect) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => match (emulation::boolean_literal(dialect), *b) {
                (BooleanLiteral::Numeric, true) => String::from("1"),
                (BooleanLiteral::Numeric, false) => String::from("0"),
                (BooleanLiteral::Keyword, true) => String::from("TRUE"),
                (BooleanLiteral::Keyword, false) => String::from("FALSE"),
            },
            Self::Int(n) => format!("{n}"),
            Self::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 {
                    format!("{f:.1}")
                } else {
                    format!("{f}")
                }
            }
            Self::Text(s) => {
                let escaped = s.replace('\'', "''");
                format!("'{escaped}'")
            }
            Self::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                match dialect.family() {
                    Family::Postgres | Family::YugabyteDb => format!("'\\x{hex}'::bytea"),
                    _ => format!("X'{hex}'"),
                }
            }
        }
    }

    /// Returns whether this is the NULL value.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the data type naturally associated with this value.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Other,
            Self::Bool(_) => DataType::Boolean,
            Self::Int(_) => DataType::BigInt,
            Self::Float(_) => DataType::Double,
            Self::Text(_) => DataType::Varchar(None),
            Self::Blob(_) => DataType::Blob,
        }
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

macro_rules! impl_to_sql_value_int {
    ($($ty:ty),+) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::Int(i64::from(self))
                }
            }
        )+
    };
}

impl_to_sql_value_int!(i8, i16, i32, i64, u8, u16, u32);

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}
