//! SQL dialect support.
//!
//! A [`Dialect`] identifies one concrete target database (sometimes pinned to
//! a version range). Each dialect belongs to exactly one [`Family`], and most
//! emulation rules are shared across a family. Version-specific gaps are
//! expressed with a [`DialectSet`].

mod set;

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

pub use set::DialectSet;

/// A concrete target database.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Standard SQL, used when no specific database is targeted.
    #[default]
    Default,
    /// CUBRID.
    Cubrid,
    /// Apache Derby.
    Derby,
    /// DuckDB.
    DuckDb,
    /// Firebird 3.x.
    Firebird3,
    /// Firebird 4.x and later.
    Firebird4,
    /// H2.
    H2,
    /// HSQLDB.
    Hsqldb,
    /// MariaDB.
    MariaDb,
    /// MySQL 5.7.
    MySql57,
    /// MySQL 8.0 and later.
    MySql8,
    /// PostgreSQL 14 and 15.
    Postgres14,
    /// PostgreSQL 16 and later.
    Postgres16,
    /// SQLite 3.39 and later.
    Sqlite,
    /// Trino.
    Trino,
    /// YugabyteDB.
    YugabyteDb,
}

/// A group of dialects sharing emulation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    /// Standard SQL.
    Default,
    /// CUBRID.
    Cubrid,
    /// Apache Derby.
    Derby,
    /// DuckDB.
    DuckDb,
    /// Firebird.
    Firebird,
    /// H2.
    H2,
    /// HSQLDB.
    Hsqldb,
    /// MariaDB.
    MariaDb,
    /// MySQL.
    MySql,
    /// PostgreSQL.
    Postgres,
    /// SQLite.
    Sqlite,
    /// Trino.
    Trino,
    /// YugabyteDB.
    YugabyteDb,
}

/// How bind values are represented in rendered SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// JDBC/SQLite style `?`.
    Question,
    /// PostgreSQL style `$1`, `$2`, ...
    Dollar,
}

impl Dialect {
    /// Every supported dialect, in declaration order.
    pub const ALL: [Self; 16] = [
        Self::Default,
        Self::Cubrid,
        Self::Derby,
        Self::DuckDb,
        Self::Firebird3,
        Self::Firebird4,
        Self::H2,
        Self::Hsqldb,
        Self::MariaDb,
        Self::MySql57,
        Self::MySql8,
        Self::Postgres14,
        Self::Postgres16,
        Self::Sqlite,
        Self::Trino,
        Self::YugabyteDb,
    ];

    /// Returns the family this dialect belongs to.
    #[must_use]
    pub const fn family(self) -> Family {
        match self {
            Self::Default => Family::Default,
            Self::Cubrid => Family::Cubrid,
            Self::Derby => Family::Derby,
            Self::DuckDb => Family::DuckDb,
            Self::Firebird3 | Self::Firebird4 => Family::Firebird,
            Self::H2 => Family::H2,
            Self::Hsqldb => Family::Hsqldb,
            Self::MariaDb => Family::MariaDb,
            Self::MySql57 | Self::MySql8 => Family::MySql,
            Self::Postgres14 | Self::Postgres16 => Family::Postgres,
            Self::Sqlite => Family::Sqlite,
            Self::Trino => Family::Trino,
            Self::YugabyteDb => Family::YugabyteDb,
        }
    }

    /// Returns the name of the dialect.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Cubrid => "cubrid",
            Self::Derby => "derby",
            Self::DuckDb => "duckdb",
            Self::Firebird3 => "firebird3",
            Self::Firebird4 => "firebird4",
            Self::H2 => "h2",
            Self::Hsqldb => "hsqldb",
            Self::MariaDb => "mariadb",
            Self::MySql57 => "mysql57",
            Self::MySql8 => "mysql8",
            Self::Postgres14 => "postgres14",
            Self::Postgres16 => "postgres16",
            Self::Sqlite => "sqlite",
            Self::Trino => "trino",
            Self::YugabyteDb => "yugabytedb",
        }
    }

    /// Returns the identifier quote character (e.g., `"` for standard SQL, `` ` `` for MySQL).
    #[must_use]
    pub const fn identifier_quote(self) -> char {
        match self.family() {
            Family::MySql | Family::MariaDb => '`',
            _ => '"',
        }
    }

    /// Returns the bind placeholder style.
    #[must_use]
    pub const fn placeholder_style(self) -> PlaceholderStyle {
        match self.family() {
            Family::Postgres | Family::YugabyteDb => PlaceholderStyle::Dollar,
            _ => PlaceholderStyle::Question,
        }
    }

    /// Quotes an identifier, doubling any embedded quote character.
    #[must_use]
    pub fn quote_identifier(self, name: &str) -> String {
        let quote = self.identifier_quote();
        let escaped = name.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }

    pub(crate) const fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

impl Family {
    /// Returns the name of the family.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Cubrid => "cubrid",
            Self::Derby => "derby",
            Self::DuckDb => "duckdb",
            Self::Firebird => "firebird",
            Self::H2 => "h2",
            Self::Hsqldb => "hsqldb",
            Self::MariaDb => "mariadb",
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
            Self::Trino => "trino",
            Self::YugabyteDb => "yugabytedb",
        }
    }

    /// Returns the most recent dialect of this family.
    #[must_use]
    pub const fn latest(self) -> Dialect {
        match self {
            Self::Default => Dialect::Default,
            Self::Cubrid => Dialect::Cubrid,
            Self::Derby => Dialect::Derby,
            Self::DuckDb => Dialect::DuckDb,
            Self::Firebird => Dialect::Firebird4,
            Self::H2 => Dialect::H2,
            Self::Hsqldb => Dialect::Hsqldb,
            Self::MariaDb => Dialect::MariaDb,
            Self::MySql => Dialect::MySql8,
            Self::Postgres => Dialect::Postgres16,
            Self::Sqlite => Dialect::Sqlite,
            Self::Trino => Dialect::Trino,
            Self::YugabyteDb => Dialect::YugabyteDb,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a dialect name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown SQL dialect: {0}")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    /// Parses a dialect or family name. Family names resolve to the latest
    /// dialect of that family (`postgres` → [`Dialect::Postgres16`]).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        if let Some(dialect) = Self::ALL.iter().find(|d| d.name() == wanted) {
            return Ok(*dialect);
        }
        let family = match wanted.as_str() {
            "postgres" | "postgresql" => Family::Postgres,
            "mysql" => Family::MySql,
            "firebird" => Family::Firebird,
            "yugabyte" => Family::YugabyteDb,
            "sqlite3" => Family::Sqlite,
            _ => return Err(UnknownDialect(s.to_string())),
        };
        Ok(family.latest())
    }
}
