//! Per-dialect emulation decisions.
//!
//! Every construct that lacks native support in at least one dialect has a
//! strategy enum and a selector. Selectors match exhaustively on [`Family`],
//! so adding a family forces a decision for each construct; gaps that only
//! affect some versions of a family are recorded as [`DialectSet`] constants.
//!
//! When several strategies could apply, selectors prefer native support, then
//! a named substitute function, then a general `CASE`/comparison emulation,
//! and report unsupported only when nothing else works.

use crate::dialect::{Dialect, DialectSet, Family};

/// Dialects lacking row value `IS [NOT] NULL` tests over subqueries.
pub const EMULATE_NULL_QUERY: DialectSet = DialectSet::families(&[
    Family::Derby,
    Family::DuckDb,
    Family::Firebird,
    Family::Postgres,
    Family::Sqlite,
    Family::Trino,
    Family::YugabyteDb,
]);

/// Dialects lacking `ABSENT ON NULL` / `NULL ON NULL` in JSON constructors.
pub const NO_SUPPORT_ABSENT_ON_NULL: DialectSet =
    DialectSet::families(&[Family::MariaDb, Family::MySql, Family::Sqlite]);

/// Dialects lacking `NULL ON EMPTY` in `JSON_VALUE`.
pub const NO_SUPPORT_NULL_ON_EMPTY: DialectSet = DialectSet::families(&[Family::Trino]);

/// Dialects with `XMLEXISTS`.
pub const SUPPORT_XML: DialectSet =
    DialectSet::families(&[Family::Default, Family::Postgres, Family::YugabyteDb]);

/// Dialects lacking `LATERAL` derived tables.
pub const NO_SUPPORT_LATERAL: DialectSet = DialectSet::families(&[
    Family::Cubrid,
    Family::Derby,
    Family::MariaDb,
    Family::Sqlite,
])
.union(DialectSet::of(&[Dialect::MySql57, Dialect::Firebird3]));

/// Dialects lacking window functions.
pub const NO_SUPPORT_WINDOW: DialectSet =
    DialectSet::families(&[Family::Derby, Family::Hsqldb]).union(DialectSet::of(&[Dialect::MySql57]));

/// Dialects rejecting constant expressions in `PARTITION BY`.
pub const NO_SUPPORT_CONSTANT_PARTITION: DialectSet =
    DialectSet::families(&[Family::Firebird, Family::Trino]);

/// Dialects lacking derived column lists (`AS t(a, b)`).
pub const NO_SUPPORT_DERIVED_COLUMN_LIST: DialectSet =
    DialectSet::families(&[Family::Cubrid, Family::MariaDb, Family::Sqlite])
        .union(DialectSet::of(&[Dialect::MySql57]));

/// Dialects lacking `NULLS FIRST` / `NULLS LAST`.
pub const NO_SUPPORT_NULLS_ORDERING: DialectSet =
    DialectSet::families(&[Family::Cubrid, Family::MariaDb, Family::MySql]);

/// Choice for `GREATEST` and `LEAST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariadicStrategy {
    /// Render the standard function name.
    Native,
    /// Render a differently named function with the same semantics.
    Substitute(&'static str),
    /// Expand into nested `CASE` expressions.
    CaseEmulation,
}

/// Selects how to render `GREATEST`.
#[must_use]
pub const fn greatest(dialect: Dialect) -> VariadicStrategy {
    match dialect.family() {
        Family::Firebird => VariadicStrategy::Substitute("MAXVALUE"),
        Family::Sqlite => VariadicStrategy::Substitute("MAX"),
        Family::Derby => VariadicStrategy::CaseEmulation,
        Family::Default
        | Family::Cubrid
        | Family::DuckDb
        | Family::H2
        | Family::Hsqldb
        | Family::MariaDb
        | Family::MySql
        | Family::Postgres
        | Family::Trino
        | Family::YugabyteDb => VariadicStrategy::Native,
    }
}

/// Selects how to render `LEAST`.
#[must_use]
pub const fn least(dialect: Dialect) -> VariadicStrategy {
    match dialect.family() {
        Family::Firebird => VariadicStrategy::Substitute("MINVALUE"),
        Family::Sqlite => VariadicStrategy::Substitute("MIN"),
        _ => greatest(dialect),
    }
}

/// Choice for `COALESCE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoalesceStrategy {
    /// Render arguments as they are.
    Native,
    /// Wrap boolean arguments in parentheses.
    ParenthesizeBooleans,
}

/// Selects how to render `COALESCE`.
#[must_use]
pub const fn coalesce(dialect: Dialect) -> CoalesceStrategy {
    match dialect.family() {
        Family::Derby => CoalesceStrategy::ParenthesizeBooleans,
        _ => CoalesceStrategy::Native,
    }
}

/// Choice for constructs that exist either as an operator or as a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorStrategy {
    /// Infix or prefix operator.
    Operator(&'static str),
    /// Function call taking the operands as arguments.
    Function(&'static str),
    /// Not available.
    Unsupported,
}

/// Selects how to render bitwise NOT.
#[must_use]
pub const fn bit_not(dialect: Dialect) -> OperatorStrategy {
    match dialect.family() {
        Family::Firebird => OperatorStrategy::Function("BIN_NOT"),
        Family::H2 | Family::Hsqldb => OperatorStrategy::Function("BITNOT"),
        Family::Trino => OperatorStrategy::Function("bitwise_not"),
        Family::Derby => OperatorStrategy::Unsupported,
        Family::Default
        | Family::Cubrid
        | Family::DuckDb
        | Family::MariaDb
        | Family::MySql
        | Family::Postgres
        | Family::Sqlite
        | Family::YugabyteDb => OperatorStrategy::Operator("~"),
    }
}

/// Selects how to render bitwise AND.
#[must_use]
pub const fn bit_and(dialect: Dialect) -> OperatorStrategy {
    match dialect.family() {
        Family::Firebird => OperatorStrategy::Function("BIN_AND"),
        Family::H2 | Family::Hsqldb => OperatorStrategy::Function("BITAND"),
        Family::Trino => OperatorStrategy::Function("bitwise_and"),
        Family::Derby => OperatorStrategy::Unsupported,
        Family::Default
        | Family::Cubrid
        | Family::DuckDb
        | Family::MariaDb
        | Family::MySql
        | Family::Postgres
        | Family::Sqlite
        | Family::YugabyteDb => OperatorStrategy::Operator("&"),
    }
}

/// Selects how to render bitwise OR.
#[must_use]
pub const fn bit_or(dialect: Dialect) -> OperatorStrategy {
    match dialect.family() {
        Family::Firebird => OperatorStrategy::Function("BIN_OR"),
        Family::H2 | Family::Hsqldb => OperatorStrategy::Function("BITOR"),
        Family::Trino => OperatorStrategy::Function("bitwise_or"),
        Family::Derby => OperatorStrategy::Unsupported,
        _ => OperatorStrategy::Operator("|"),
    }
}

/// Selects how to render the remainder operator.
#[must_use]
pub const fn modulo(dialect: Dialect) -> OperatorStrategy {
    match dialect.family() {
        Family::Derby | Family::Firebird => OperatorStrategy::Function("MOD"),
        _ => OperatorStrategy::Operator("%"),
    }
}

/// Selects how to render string concatenation.
#[must_use]
pub const fn concat(dialect: Dialect) -> OperatorStrategy {
    match dialect.family() {
        Family::MySql | Family::MariaDb => OperatorStrategy::Function("CONCAT"),
        _ => OperatorStrategy::Operator("||"),
    }
}

/// Choice for a plain aggregate function name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateName {
    /// The function exists under this name.
    Named(&'static str),
    /// No equivalent aggregate exists.
    Unsupported,
}

/// Selects the name of the bitwise AND aggregate.
#[must_use]
pub const fn bit_and_agg(dialect: Dialect) -> AggregateName {
    match dialect.family() {
        Family::Cubrid
        | Family::DuckDb
        | Family::MariaDb
        | Family::MySql
        | Family::Postgres
        | Family::YugabyteDb => AggregateName::Named("BIT_AND"),
        Family::Default | Family::H2 | Family::Hsqldb => AggregateName::Named("BIT_AND_AGG"),
        Family::Trino => AggregateName::Named("bitwise_and_agg"),
        Family::Derby | Family::Firebird | Family::Sqlite => AggregateName::Unsupported,
    }
}

/// Selects the name of the bitwise OR aggregate.
#[must_use]
pub const fn bit_or_agg(dialect: Dialect) -> AggregateName {
    match dialect.family() {
        Family::Default | Family::H2 | Family::Hsqldb => AggregateName::Named("BIT_OR_AGG"),
        Family::Trino => AggregateName::Named("bitwise_or_agg"),
        Family::Derby | Family::Firebird | Family::Sqlite => AggregateName::Unsupported,
        _ => AggregateName::Named("BIT_OR"),
    }
}

/// Choice for `BIT_NAND_AGG` and `BIT_NOR_AGG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegatedAggregateStrategy {
    /// Render the aggregate natively.
    Native,
    /// Apply bitwise NOT to the non-negated aggregate.
    BitNotOfAggregate,
}

/// Selects how to render negated bitwise aggregates.
#[must_use]
pub const fn negated_bit_agg(dialect: Dialect) -> NegatedAggregateStrategy {
    match dialect.family() {
        Family::Default | Family::H2 => NegatedAggregateStrategy::Native,
        Family::Cubrid
        | Family::Derby
        | Family::DuckDb
        | Family::Firebird
        | Family::Hsqldb
        | Family::MariaDb
        | Family::MySql
        | Family::Postgres
        | Family::Sqlite
        | Family::Trino
        | Family::YugabyteDb => NegatedAggregateStrategy::BitNotOfAggregate,
    }
}

/// Choice for `JSON_OBJECT` and `JSON_ARRAY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonConstructorStrategy {
    /// `JSON_OBJECT(KEY k VALUE v [ABSENT ON NULL])`.
    Standard,
    /// `JSON_OBJECT(k, v)`.
    CommaSeparated,
    /// `json_build_object(k, v)`, wrapped in `json_strip_nulls` for ABSENT ON NULL.
    BuildFunction,
    /// Not available.
    Unsupported,
}

/// Selects how to render JSON constructors.
#[must_use]
pub const fn json_constructor(dialect: Dialect) -> JsonConstructorStrategy {
    match dialect.family() {
        Family::Default | Family::DuckDb | Family::H2 | Family::Hsqldb | Family::Trino => {
            JsonConstructorStrategy::Standard
        }
        Family::Postgres => match dialect {
            Dialect::Postgres14 => JsonConstructorStrategy::BuildFunction,
            _ => JsonConstructorStrategy::Standard,
        },
        Family::YugabyteDb => JsonConstructorStrategy::BuildFunction,
        Family::MariaDb | Family::MySql | Family::Sqlite => JsonConstructorStrategy::CommaSeparated,
        Family::Cubrid | Family::Derby | Family::Firebird => JsonConstructorStrategy::Unsupported,
    }
}

/// Returns whether the `ON NULL` clause of JSON constructors may be emitted.
#[must_use]
pub const fn json_on_null(dialect: Dialect) -> bool {
    !NO_SUPPORT_ABSENT_ON_NULL.contains(dialect)
}

/// Returns whether the `ON EMPTY` clause of `JSON_VALUE` may be emitted.
#[must_use]
pub const fn json_on_empty(dialect: Dialect) -> bool {
    !NO_SUPPORT_NULL_ON_EMPTY.contains(dialect)
}

/// Choice for `JSON_VALUE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonValueStrategy {
    /// `JSON_VALUE(doc, path ...)`.
    Standard,
    /// A function taking the document and the path.
    Substitute(&'static str),
    /// Not available.
    Unsupported,
}

/// Selects how to render `JSON_VALUE`.
#[must_use]
pub const fn json_value(dialect: Dialect) -> JsonValueStrategy {
    match dialect.family() {
        Family::Default
        | Family::DuckDb
        | Family::H2
        | Family::MariaDb
        | Family::MySql
        | Family::Trino => JsonValueStrategy::Standard,
        Family::Sqlite => JsonValueStrategy::Substitute("json_extract"),
        Family::Postgres | Family::YugabyteDb => {
            JsonValueStrategy::Substitute("jsonb_path_query_first")
        }
        Family::Cubrid | Family::Derby | Family::Firebird | Family::Hsqldb => {
            JsonValueStrategy::Unsupported
        }
    }
}

/// Choice for `(SELECT ...) IS [NOT] NULL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullTestStrategy {
    /// Apply the predicate to the subquery directly.
    Standard,
    /// Count the rows whose every column passes the predicate.
    CountRewrite,
}

/// Selects how to test a subquery with `columns` flattened select fields for NULL.
#[must_use]
pub const fn select_is_null(dialect: Dialect, columns: usize) -> NullTestStrategy {
    if columns != 1 && EMULATE_NULL_QUERY.contains(dialect) {
        NullTestStrategy::CountRewrite
    } else {
        NullTestStrategy::Standard
    }
}

/// Choice for logical XOR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XorStrategy {
    /// `a XOR b`.
    Native,
    /// `(a) <> (b)`.
    NotEqual,
}

/// Selects how to render logical XOR.
#[must_use]
pub const fn xor(dialect: Dialect) -> XorStrategy {
    match dialect.family() {
        Family::MySql | Family::MariaDb => XorStrategy::Native,
        _ => XorStrategy::NotEqual,
    }
}

/// Choice for conditions used where a field is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionFieldStrategy {
    /// Render the condition as a boolean value.
    Native,
    /// `CASE WHEN c THEN TRUE WHEN NOT (c) THEN FALSE END`.
    CaseEmulation,
}

/// Selects how to render a condition used as a field.
#[must_use]
pub const fn condition_as_field(dialect: Dialect) -> ConditionFieldStrategy {
    match dialect.family() {
        Family::Cubrid | Family::Derby => ConditionFieldStrategy::CaseEmulation,
        _ => ConditionFieldStrategy::Native,
    }
}

/// Choice for boolean literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanLiteral {
    /// `TRUE` / `FALSE`.
    Keyword,
    /// `1` / `0`.
    Numeric,
}

/// Selects how to render boolean literals.
#[must_use]
pub const fn boolean_literal(dialect: Dialect) -> BooleanLiteral {
    match dialect.family() {
        Family::Cubrid => BooleanLiteral::Numeric,
        _ => BooleanLiteral::Keyword,
    }
}

/// Choice for the WITH clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithStrategy {
    /// WITH may appear at any nesting level.
    Native,
    /// WITH is only valid on the outermost statement.
    HoistToTopLevel,
    /// WITH is not available.
    Unsupported,
}

/// Selects how to render common table expressions.
#[must_use]
pub const fn with_clause(dialect: Dialect) -> WithStrategy {
    match dialect.family() {
        Family::Derby => WithStrategy::Unsupported,
        Family::MySql => match dialect {
            Dialect::MySql57 => WithStrategy::Unsupported,
            _ => WithStrategy::Native,
        },
        Family::Firebird | Family::Hsqldb => WithStrategy::HoistToTopLevel,
        Family::Default
        | Family::Cubrid
        | Family::DuckDb
        | Family::H2
        | Family::MariaDb
        | Family::Postgres
        | Family::Sqlite
        | Family::Trino
        | Family::YugabyteDb => WithStrategy::Native,
    }
}

/// Choice for row limiting clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitStrategy {
    /// `LIMIT n OFFSET m`.
    LimitOffset,
    /// `OFFSET m ROWS FETCH NEXT n ROWS ONLY`.
    OffsetFetch,
}

/// Selects how to render LIMIT and OFFSET.
#[must_use]
pub const fn limit(dialect: Dialect) -> LimitStrategy {
    match dialect.family() {
        Family::Default | Family::Derby | Family::Firebird | Family::Trino => {
            LimitStrategy::OffsetFetch
        }
        Family::Cubrid
        | Family::DuckDb
        | Family::H2
        | Family::Hsqldb
        | Family::MariaDb
        | Family::MySql
        | Family::Postgres
        | Family::Sqlite
        | Family::YugabyteDb => LimitStrategy::LimitOffset,
    }
}

/// Returns the limit to emit when only an offset is requested, for dialects
/// where OFFSET cannot appear without LIMIT.
#[must_use]
pub const fn unbounded_limit(dialect: Dialect) -> Option<&'static str> {
    match dialect.family() {
        Family::MySql | Family::MariaDb | Family::Cubrid => Some("18446744073709551615"),
        Family::Sqlite => Some("-1"),
        _ => None,
    }
}

/// Returns whether `XMLEXISTS` is available.
#[must_use]
pub const fn xml_exists(dialect: Dialect) -> bool {
    SUPPORT_XML.contains(dialect)
}

/// Returns whether `LATERAL` is available.
#[must_use]
pub const fn lateral(dialect: Dialect) -> bool {
    !NO_SUPPORT_LATERAL.contains(dialect)
}

/// Returns whether window functions are available.
#[must_use]
pub const fn window(dialect: Dialect) -> bool {
    !NO_SUPPORT_WINDOW.contains(dialect)
}

/// Returns whether `PARTITION BY` accepts constant expressions.
#[must_use]
pub const fn constant_partition(dialect: Dialect) -> bool {
    !NO_SUPPORT_CONSTANT_PARTITION.contains(dialect)
}

/// Returns whether derived tables accept a column list after the alias.
#[must_use]
pub const fn derived_column_list(dialect: Dialect) -> bool {
    !NO_SUPPORT_DERIVED_COLUMN_LIST.contains(dialect)
}

/// Returns whether `NULLS FIRST` / `NULLS LAST` are available.
#[must_use]
pub const fn nulls_ordering(dialect: Dialect) -> bool {
    !NO_SUPPORT_NULLS_ORDERING.contains(dialect)
}

/// Returns whether index hints are rendered.
#[must_use]
pub const fn index_hints(dialect: Dialect) -> bool {
    matches!(dialect.family(), Family::MySql | Family::MariaDb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greatest_prefers_substitute_over_case() {
        assert_eq!(greatest(Dialect::Postgres16), VariadicStrategy::Native);
        assert_eq!(greatest(Dialect::Firebird3), VariadicStrategy::Substitute("MAXVALUE"));
        assert_eq!(least(Dialect::Firebird4), VariadicStrategy::Substitute("MINVALUE"));
        assert_eq!(greatest(Dialect::Sqlite), VariadicStrategy::Substitute("MAX"));
        assert_eq!(least(Dialect::Sqlite), VariadicStrategy::Substitute("MIN"));
        assert_eq!(least(Dialect::Derby), VariadicStrategy::CaseEmulation);
    }

    #[test]
    fn test_bit_aggregates() {
        assert_eq!(bit_and_agg(Dialect::Postgres14), AggregateName::Named("BIT_AND"));
        assert_eq!(bit_or_agg(Dialect::H2), AggregateName::Named("BIT_OR_AGG"));
        assert_eq!(bit_or_agg(Dialect::Trino), AggregateName::Named("bitwise_or_agg"));
        assert_eq!(bit_and_agg(Dialect::Sqlite), AggregateName::Unsupported);
        assert_eq!(negated_bit_agg(Dialect::H2), NegatedAggregateStrategy::Native);
        assert_eq!(
            negated_bit_agg(Dialect::MySql8),
            NegatedAggregateStrategy::BitNotOfAggregate
        );
    }

    #[test]
    fn test_bitwise_operators() {
        assert_eq!(bit_not(Dialect::Firebird4), OperatorStrategy::Function("BIN_NOT"));
        assert_eq!(bit_or(Dialect::Firebird4), OperatorStrategy::Function("BIN_OR"));
        assert_eq!(bit_or(Dialect::Hsqldb), OperatorStrategy::Function("BITOR"));
        assert_eq!(bit_or(Dialect::Trino), OperatorStrategy::Function("bitwise_or"));
        assert_eq!(bit_or(Dialect::Sqlite), OperatorStrategy::Operator("|"));
        assert_eq!(bit_not(Dialect::Derby), OperatorStrategy::Unsupported);
    }

    #[test]
    fn test_version_specific_gaps() {
        assert!(!lateral(Dialect::MySql57));
        assert!(lateral(Dialect::MySql8));
        assert!(!lateral(Dialect::Firebird3));
        assert!(lateral(Dialect::Firebird4));
        assert_eq!(with_clause(Dialect::MySql57), WithStrategy::Unsupported);
        assert_eq!(with_clause(Dialect::MySql8), WithStrategy::Native);
        assert_eq!(json_constructor(Dialect::Postgres14), JsonConstructorStrategy::BuildFunction);
        assert_eq!(json_constructor(Dialect::Postgres16), JsonConstructorStrategy::Standard);
    }

    #[test]
    fn test_comma_form_only_where_on_null_is_unavailable() {
        for dialect in Dialect::ALL {
            if json_constructor(dialect) == JsonConstructorStrategy::CommaSeparated {
                assert!(!json_on_null(dialect), "{dialect}");
            }
        }
        assert_eq!(json_constructor(Dialect::DuckDb), JsonConstructorStrategy::Standard);
    }

    #[test]
    fn test_json_clause_capabilities_are_independent() {
        assert!(!json_on_null(Dialect::MySql8));
        assert!(json_on_empty(Dialect::MySql8));
        assert!(json_on_null(Dialect::Trino));
        assert!(!json_on_empty(Dialect::Trino));
    }

    #[test]
    fn test_select_is_null_skips_rewrite_for_single_column() {
        assert_eq!(select_is_null(Dialect::Postgres16, 1), NullTestStrategy::Standard);
        assert_eq!(select_is_null(Dialect::Postgres16, 2), NullTestStrategy::CountRewrite);
        assert_eq!(select_is_null(Dialect::H2, 2), NullTestStrategy::Standard);
    }

    #[test]
    fn test_every_dialect_has_a_limit_rendering() {
        for dialect in Dialect::ALL {
            match limit(dialect) {
                LimitStrategy::LimitOffset | LimitStrategy::OffsetFetch => {}
            }
        }
        assert_eq!(unbounded_limit(Dialect::Sqlite), Some("-1"));
        assert_eq!(unbounded_limit(Dialect::Postgres16), None);
    }
}
