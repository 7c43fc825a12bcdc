//! Function calls, aggregates and CASE expressions.

use core::iter;

use tracing::debug;

use super::condition::{ComparisonOp, Condition};
use super::field::{first_known, transform_all, Field};
use super::select::SortField;
use super::types::DataType;
use crate::dialect::Dialect;
use crate::emulation::{
    self, AggregateName, CoalesceStrategy, NegatedAggregateStrategy, VariadicStrategy,
};
use crate::error::{RenderError, Result};
use crate::render::{QueryPart, RenderContext};

macro_rules! variadic_function {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            args: Vec<Field>,
        }

        impl $name {
            /// Creates the function over `args`.
            #[must_use]
            pub fn new(args: impl IntoIterator<Item = Field>) -> Self {
                Self {
                    args: args.into_iter().collect(),
                }
            }

            /// The arguments.
            #[must_use]
            pub fn args(&self) -> &[Field] {
                &self.args
            }

            /// Rebuilds the function over new arguments.
            #[must_use]
            #[allow(clippy::unused_self)]
            pub fn with_args(&self, args: impl IntoIterator<Item = Field>) -> Self {
                Self::new(args)
            }
        }

        impl From<$name> for Field {
            fn from(function: $name) -> Self {
                Self::$name(function)
            }
        }
    };
}

variadic_function!(
    /// `GREATEST(a, b, ...)`: the largest argument, or NULL if any argument is NULL.
    Greatest
);
variadic_function!(
    /// `LEAST(a, b, ...)`: the smallest argument, or NULL if any argument is NULL.
    Least
);
variadic_function!(
    /// `COALESCE(a, b, ...)`: the first non-NULL argument.
    Coalesce
);

/// `GREATEST(args)`.
#[must_use]
pub fn greatest(args: impl IntoIterator<Item = Field>) -> Field {
    Field::Greatest(Greatest::new(args))
}

/// `LEAST(args)`.
#[must_use]
pub fn least(args: impl IntoIterator<Item = Field>) -> Field {
    Field::Least(Least::new(args))
}

/// `COALESCE(args)`.
#[must_use]
pub fn coalesce(args: impl IntoIterator<Item = Field>) -> Field {
    Field::Coalesce(Coalesce::new(args))
}

/// A function call rendered by name.
pub fn function(name: &str, args: impl IntoIterator<Item = Field>) -> Field {
    Field::Function(FunctionCall::new(name, args))
}

fn render_call(ctx: &mut RenderContext, name: &str, args: &[Field]) -> Result<()> {
    ctx.sql(name).sql("(");
    ctx.visit_all(args, ", ")?;
    ctx.sql(")");
    Ok(())
}

/// Renders a variadic function whose arity is below two, where no function
/// call is needed: no arguments give a NULL literal and one argument stands
/// for itself. Returns `false` when there are two or more arguments.
fn render_degenerate(ctx: &mut RenderContext, args: &[Field]) -> Result<bool> {
    match args {
        [] => ctx.visit(&Field::null(DataType::Other))?,
        [single] => ctx.visit(single)?,
        _ => return Ok(false),
    }
    Ok(true)
}

fn render_extremum(
    ctx: &mut RenderContext,
    native: &str,
    strategy: VariadicStrategy,
    compare: ComparisonOp,
    args: &[Field],
    rebuild: fn(Vec<Field>) -> Field,
) -> Result<()> {
    if render_degenerate(ctx, args)? {
        return Ok(());
    }
    match (strategy, args) {
        (VariadicStrategy::Native, _) => render_call(ctx, native, args),
        (VariadicStrategy::Substitute(name), _) => {
            debug!(dialect = %ctx.dialect(), function = native, substitute = name, "Using substitute function");
            render_call(ctx, name, args)
        }
        (VariadicStrategy::CaseEmulation, [first, second, rest @ ..]) => {
            debug!(dialect = %ctx.dialect(), function = native, "Emulating with CASE");
            ctx.visit(&case_emulation(first, second, rest, compare, rebuild))
        }
        (VariadicStrategy::CaseEmulation, _) => unreachable!("arity below two is handled above"),
    }
}

/// `CASE WHEN a IS NULL OR b IS NULL THEN NULL WHEN a <op> b THEN f(a, rest)
/// ELSE f(b, rest) END`, with `f` rebuilding the function so that longer
/// argument lists expand recursively. The first argument wins ties.
fn case_emulation(
    first: &Field,
    second: &Field,
    rest: &[Field],
    compare: ComparisonOp,
    rebuild: fn(Vec<Field>) -> Field,
) -> Field {
    let keep = |winner: &Field| {
        rebuild(
            iter::once(winner.clone())
                .chain(rest.iter().cloned())
                .collect(),
        )
    };
    let any_null = first.clone().is_null().or(second.clone().is_null());
    let wins = Condition::Compare {
        left: Box::new(first.clone()),
        op: compare,
        right: Box::new(second.clone()),
    };
    Field::Case(Case::searched(
        [
            (any_null, Field::null(first_known([first, second]))),
            (wins, keep(first)),
        ],
        Some(keep(second)),
    ))
}

impl QueryPart for Greatest {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        let strategy = emulation::greatest(ctx.dialect());
        render_extremum(ctx, "GREATEST", strategy, ComparisonOp::GtEq, &self.args, greatest)
    }
}

impl QueryPart for Least {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        let strategy = emulation::least(ctx.dialect());
        render_extremum(ctx, "LEAST", strategy, ComparisonOp::LtEq, &self.args, least)
    }
}

impl QueryPart for Coalesce {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        if render_degenerate(ctx, &self.args)? {
            return Ok(());
        }
        let strategy = emulation::coalesce(ctx.dialect());
        ctx.sql("COALESCE(");
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                ctx.sql(", ");
            }
            if strategy == CoalesceStrategy::ParenthesizeBooleans && arg.data_type().is_boolean() {
                ctx.sql("(");
                ctx.visit(arg)?;
                ctx.sql(")");
            } else {
                ctx.visit(arg)?;
            }
        }
        ctx.sql(")");
        Ok(())
    }
}

/// A function call rendered by name, with no dialect-specific handling.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    name: String,
    args: Vec<Field>,
}

impl FunctionCall {
    /// Creates a function call.
    #[must_use]
    pub fn new(name: &str, args: impl IntoIterator<Item = Field>) -> Self {
        Self {
            name: String::from(name),
            args: args.into_iter().collect(),
        }
    }

    /// The function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The arguments.
    #[must_use]
    pub fn args(&self) -> &[Field] {
        &self.args
    }

    /// Rebuilds the call over new arguments.
    #[must_use]
    pub fn with_args(&self, args: impl IntoIterator<Item = Field>) -> Self {
        Self::new(&self.name, args)
    }
}

impl QueryPart for FunctionCall {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        render_call(ctx, &self.name, &self.args)
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    /// `COUNT(x)`.
    Count,
    /// `COUNT(*)`.
    CountStar,
    /// `SUM(x)`.
    Sum,
    /// `AVG(x)`.
    Avg,
    /// `MIN(x)`.
    Min,
    /// `MAX(x)`.
    Max,
    /// Bitwise AND over all values.
    BitAndAgg,
    /// Bitwise OR over all values.
    BitOrAgg,
    /// Bitwise NOT of the bitwise AND over all values.
    BitNandAgg,
    /// Bitwise NOT of the bitwise OR over all values.
    BitNorAgg,
}

/// An aggregate function, optionally used as a window function.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    kind: AggregateKind,
    value: Option<Box<Field>>,
    distinct: bool,
    over: Option<WindowSpec>,
}

impl Aggregate {
    /// Creates an aggregate over `value`.
    #[must_use]
    pub fn new(kind: AggregateKind, value: Field) -> Self {
        Self {
            kind,
            value: Some(Box::new(value)),
            distinct: false,
            over: None,
        }
    }

    /// Creates `COUNT(*)`.
    #[must_use]
    pub const fn count_star() -> Self {
        Self {
            kind: AggregateKind::CountStar,
            value: None,
            distinct: false,
            over: None,
        }
    }

    /// Aggregates distinct values only.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Turns the aggregate into a window function.
    #[must_use]
    pub fn over(mut self, window: WindowSpec) -> Self {
        self.over = Some(window);
        self
    }

    /// The aggregate function.
    #[must_use]
    pub const fn kind(&self) -> AggregateKind {
        self.kind
    }

    /// The aggregated value; `None` for `COUNT(*)`.
    #[must_use]
    pub fn value(&self) -> Option<&Field> {
        self.value.as_deref()
    }

    /// Whether only distinct values are aggregated.
    #[must_use]
    pub const fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// The window, if this is a window function.
    #[must_use]
    pub const fn window(&self) -> Option<&WindowSpec> {
        self.over.as_ref()
    }

    /// Rebuilds the aggregate over a new value.
    #[must_use]
    pub fn with_value(&self, value: Field) -> Self {
        Self {
            value: Some(Box::new(value)),
            ..self.clone()
        }
    }

    pub(crate) fn map_fields<F: FnMut(Field) -> Field>(&self, f: &mut F) -> Self {
        Self {
            kind: self.kind,
            value: self.value.as_ref().map(|value| Box::new(value.transform(f))),
            distinct: self.distinct,
            over: self.over.as_ref().map(|window| window.map_fields(f)),
        }
    }

    pub(crate) fn data_type(&self) -> DataType {
        match self.kind {
            AggregateKind::Count | AggregateKind::CountStar => DataType::BigInt,
            AggregateKind::Avg => DataType::Decimal {
                precision: None,
                scale: None,
            },
            _ => self.value().map(Field::data_type).unwrap_or_default(),
        }
    }

    fn name(&self, dialect: Dialect) -> Result<&'static str> {
        let named = |name: AggregateName, construct: &'static str| match name {
            AggregateName::Named(name) => Ok(name),
            AggregateName::Unsupported => Err(RenderError::unsupported(construct, dialect)),
        };
        match self.kind {
            AggregateKind::Count | AggregateKind::CountStar => Ok("COUNT"),
            AggregateKind::Sum => Ok("SUM"),
            AggregateKind::Avg => Ok("AVG"),
            AggregateKind::Min => Ok("MIN"),
            AggregateKind::Max => Ok("MAX"),
            AggregateKind::BitAndAgg => named(emulation::bit_and_agg(dialect), "BIT_AND_AGG"),
            AggregateKind::BitOrAgg => named(emulation::bit_or_agg(dialect), "BIT_OR_AGG"),
            AggregateKind::BitNandAgg => Ok("BIT_NAND_AGG"),
            AggregateKind::BitNorAgg => Ok("BIT_NOR_AGG"),
        }
    }
}

impl From<Aggregate> for Field {
    fn from(aggregate: Aggregate) -> Self {
        Self::Aggregate(aggregate)
    }
}

impl QueryPart for Aggregate {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        let negated = match self.kind {
            AggregateKind::BitNandAgg => Some(AggregateKind::BitAndAgg),
            AggregateKind::BitNorAgg => Some(AggregateKind::BitOrAgg),
            _ => None,
        };
        if let Some(kind) = negated {
            if emulation::negated_bit_agg(ctx.dialect())
                == NegatedAggregateStrategy::BitNotOfAggregate
            {
                debug!(dialect = %ctx.dialect(), aggregate = ?self.kind, "Rewriting as bitwise NOT of aggregate");
                let inner = Self {
                    kind,
                    ..self.clone()
                };
                return ctx.visit(&!Field::Aggregate(inner));
            }
        }

        let name = self.name(ctx.dialect())?;
        ctx.sql(name).sql("(");
        if self.distinct {
            ctx.keyword("DISTINCT ");
        }
        match &self.value {
            Some(value) => ctx.visit(value.as_ref())?,
            None => {
                ctx.sql("*");
            }
        }
        ctx.sql(")");
        if let Some(window) = &self.over {
            ctx.sql(" ");
            ctx.visit(window)?;
        }
        Ok(())
    }
}

/// `COUNT(value)`.
#[must_use]
pub fn count(value: Field) -> Field {
    Aggregate::new(AggregateKind::Count, value).into()
}

/// `COUNT(*)`.
#[must_use]
pub const fn count_star() -> Field {
    Field::Aggregate(Aggregate::count_star())
}

/// `SUM(value)`.
#[must_use]
pub fn sum(value: Field) -> Field {
    Aggregate::new(AggregateKind::Sum, value).into()
}

/// `MIN(value)`.
#[must_use]
pub fn min(value: Field) -> Field {
    Aggregate::new(AggregateKind::Min, value).into()
}

/// `MAX(value)`.
#[must_use]
pub fn max(value: Field) -> Field {
    Aggregate::new(AggregateKind::Max, value).into()
}

/// `BIT_AND_AGG(value)`.
#[must_use]
pub fn bit_and_agg(value: Field) -> Field {
    Aggregate::new(AggregateKind::BitAndAgg, value).into()
}

/// `BIT_OR_AGG(value)`.
#[must_use]
pub fn bit_or_agg(value: Field) -> Field {
    Aggregate::new(AggregateKind::BitOrAgg, value).into()
}

/// `BIT_NAND_AGG(value)`.
#[must_use]
pub fn bit_nand_agg(value: Field) -> Field {
    Aggregate::new(AggregateKind::BitNandAgg, value).into()
}

/// `BIT_NOR_AGG(value)`.
#[must_use]
pub fn bit_nor_agg(value: Field) -> Field {
    Aggregate::new(AggregateKind::BitNorAgg, value).into()
}

/// A window specification, `OVER (PARTITION BY ... ORDER BY ...)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowSpec {
    partition_by: Vec<Field>,
    order_by: Vec<SortField>,
}

impl WindowSpec {
    /// Creates an empty window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the partitioning expressions.
    #[must_use]
    pub fn partition_by(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.partition_by = fields.into_iter().collect();
        self
    }

    /// Sets the ordering.
    #[must_use]
    pub fn order_by(mut self, sort: impl IntoIterator<Item = SortField>) -> Self {
        self.order_by = sort.into_iter().collect();
        self
    }

    /// The partitioning expressions.
    #[must_use]
    pub fn partitions(&self) -> &[Field] {
        &self.partition_by
    }

    /// The ordering.
    #[must_use]
    pub fn ordering(&self) -> &[SortField] {
        &self.order_by
    }

    pub(crate) fn map_fields<F: FnMut(Field) -> Field>(&self, f: &mut F) -> Self {
        Self {
            partition_by: transform_all(&self.partition_by, f),
            order_by: self
                .order_by
                .iter()
                .map(|sort| sort.with_field(sort.field().transform(f)))
                .collect(),
        }
    }
}

impl QueryPart for WindowSpec {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        let dialect = ctx.dialect();
        if !emulation::window(dialect) {
            return Err(RenderError::unsupported("window functions", dialect));
        }
        ctx.keyword("OVER (");
        let mut partitioned = false;
        if !self.partition_by.is_empty() {
            if !emulation::constant_partition(dialect)
                && self.partition_by.iter().all(Field::is_constant)
            {
                debug!(dialect = %dialect, "Omitting constant PARTITION BY");
            } else {
                ctx.keyword("PARTITION BY ");
                ctx.visit_all(&self.partition_by, ", ")?;
                partitioned = true;
            }
        }
        if !self.order_by.is_empty() {
            if partitioned {
                ctx.sql(" ");
            }
            ctx.keyword("ORDER BY ");
            ctx.visit_all(&self.order_by, ", ")?;
        }
        ctx.sql(")");
        Ok(())
    }
}

/// A CASE expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Case {
    /// `CASE WHEN condition THEN result ... ELSE otherwise END`.
    Searched {
        /// Conditions and their results, tested in order.
        branches: Vec<(Condition, Field)>,
        /// Result when no condition holds.
        otherwise: Option<Box<Field>>,
    },
    /// `CASE value WHEN candidate THEN result ... ELSE otherwise END`.
    Simple {
        /// The value compared against each candidate.
        value: Box<Field>,
        /// Candidates and their results, tested in order.
        branches: Vec<(Field, Field)>,
        /// Result when no candidate matches.
        otherwise: Option<Box<Field>>,
    },
}

impl Case {
    /// Creates a searched CASE.
    #[must_use]
    pub fn searched(
        branches: impl IntoIterator<Item = (Condition, Field)>,
        otherwise: Option<Field>,
    ) -> Self {
        Self::Searched {
            branches: branches.into_iter().collect(),
            otherwise: otherwise.map(Box::new),
        }
    }

    /// Creates a simple CASE.
    #[must_use]
    pub fn simple(
        value: Field,
        branches: impl IntoIterator<Item = (Field, Field)>,
        otherwise: Option<Field>,
    ) -> Self {
        Self::Simple {
            value: Box::new(value),
            branches: branches.into_iter().collect(),
            otherwise: otherwise.map(Box::new),
        }
    }

    /// The possible results, including the ELSE result.
    #[must_use]
    pub fn results(&self) -> Vec<&Field> {
        let (results, otherwise): (Vec<&Field>, _) = match self {
            Self::Searched { branches, otherwise } => {
                (branches.iter().map(|(_, r)| r).collect(), otherwise)
            }
            Self::Simple {
                branches,
                otherwise,
                ..
            } => (branches.iter().map(|(_, r)| r).collect(), otherwise),
        };
        results.into_iter().chain(otherwise.as_deref()).collect()
    }

    pub(crate) fn map_fields<F: FnMut(Field) -> Field>(&self, f: &mut F) -> Self {
        match self {
            Self::Searched { branches, otherwise } => Self::Searched {
                branches: branches
                    .iter()
                    .map(|(condition, result)| (condition.map_fields(f), result.transform(f)))
                    .collect(),
                otherwise: otherwise.as_ref().map(|field| Box::new(field.transform(f))),
            },
            Self::Simple {
                value,
                branches,
                otherwise,
            } => Self::Simple {
                value: Box::new(value.transform(f)),
                branches: branches
                    .iter()
                    .map(|(candidate, result)| (candidate.transform(f), result.transform(f)))
                    .collect(),
                otherwise: otherwise.as_ref().map(|field| Box::new(field.transform(f))),
            },
        }
    }
}

impl From<Case> for Field {
    fn from(case: Case) -> Self {
        Self::Case(case)
    }
}

impl QueryPart for Case {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        let otherwise = match self {
            Self::Searched { branches, otherwise } => {
                if branches.is_empty() {
                    return render_otherwise(ctx, otherwise.as_deref());
                }
                ctx.keyword("CASE");
                for (condition, result) in branches {
                    ctx.keyword(" WHEN ");
                    ctx.visit(condition)?;
                    ctx.keyword(" THEN ");
                    ctx.visit(result)?;
                }
                otherwise
            }
            Self::Simple {
                value,
                branches,
                otherwise,
            } => {
                if branches.is_empty() {
                    return render_otherwise(ctx, otherwise.as_deref());
                }
                ctx.keyword("CASE ");
                ctx.visit(value.as_ref())?;
                for (candidate, result) in branches {
                    ctx.keyword(" WHEN ");
                    ctx.visit(candidate)?;
                    ctx.keyword(" THEN ");
                    ctx.visit(result)?;
                }
                otherwise
            }
        };
        if let Some(otherwise) = otherwise {
            ctx.keyword(" ELSE ");
            ctx.visit(otherwise.as_ref())?;
        }
        ctx.keyword(" END");
        Ok(())
    }
}

// A CASE without branches always yields its ELSE result.
fn render_otherwise(ctx: &mut RenderContext, otherwise: Option<&Field>) -> Result<()> {
    match otherwise {
        Some(field) => ctx.visit(field),
        None => ctx.visit(&Field::null(DataType::Other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qom::{col, inline, val, SortField};
    use crate::render::Renderer;

    fn render(dialect: Dialect, field: &Field) -> String {
        Renderer::new(dialect).render_inlined(field).unwrap()
    }

    #[test]
    fn test_greatest_native_and_substitutes() {
        let field = greatest([col("a"), col("b")]);
        assert_eq!(render(Dialect::Postgres16, &field), "GREATEST(a, b)");
        assert_eq!(render(Dialect::Firebird3, &field), "MAXVALUE(a, b)");
        assert_eq!(render(Dialect::Sqlite, &field), "MAX(a, b)");
        assert_eq!(render(Dialect::Sqlite, &least([col("a"), col("b")])), "MIN(a, b)");
    }

    #[test]
    fn test_greatest_case_emulation() {
        let field = greatest([col("a"), col("b")]);
        assert_eq!(
            render(Dialect::Derby, &field),
            "CASE WHEN a IS NULL OR b IS NULL THEN NULL WHEN a >= b THEN a ELSE b END"
        );
        let field = least([col("a"), col("b")]);
        assert_eq!(
            render(Dialect::Derby, &field),
            "CASE WHEN a IS NULL OR b IS NULL THEN NULL WHEN a <= b THEN a ELSE b END"
        );
    }

    #[test]
    fn test_greatest_case_emulation_recurses() {
        let field = greatest([col("a"), col("b"), col("c")]);
        assert_eq!(
            render(Dialect::Derby, &field),
            "CASE WHEN a IS NULL OR b IS NULL THEN NULL \
             WHEN a >= b THEN CASE WHEN a IS NULL OR c IS NULL THEN NULL WHEN a >= c THEN a ELSE c END \
             ELSE CASE WHEN b IS NULL OR c IS NULL THEN NULL WHEN b >= c THEN b ELSE c END END"
        );
    }

    #[test]
    fn test_degenerate_arity() {
        for dialect in Dialect::ALL {
            assert_eq!(render(dialect, &greatest([])), "NULL");
            assert_eq!(render(dialect, &coalesce([])), "NULL");
            assert_eq!(render(dialect, &least([col("x")])), render(dialect, &col("x")));
        }
    }

    #[test]
    fn test_coalesce_parenthesizes_booleans_in_derby() {
        let field = coalesce([col("a").is_null().into(), val(false)]);
        assert_eq!(
            render(Dialect::Derby, &field),
            "COALESCE((CASE WHEN a IS NULL THEN TRUE WHEN NOT (a IS NULL) THEN FALSE END), (FALSE))"
        );
        assert_eq!(render(Dialect::Postgres16, &field), "COALESCE(a IS NULL, FALSE)");
    }

    #[test]
    fn test_bit_nand_agg_rewrite() {
        let field = bit_nand_agg(col("flags"));
        assert_eq!(render(Dialect::H2, &field), "BIT_NAND_AGG(flags)");
        assert_eq!(render(Dialect::Default, &field), "BIT_NAND_AGG(flags)");
        assert_eq!(render(Dialect::Postgres16, &field), "~BIT_AND(flags)");
        assert_eq!(render(Dialect::Trino, &field), "bitwise_not(bitwise_and_agg(flags))");
        assert_eq!(render(Dialect::Hsqldb, &bit_nor_agg(col("f"))), "BITNOT(BIT_OR_AGG(f))");
        assert_eq!(
            Renderer::new(Dialect::Sqlite).render(&field),
            Err(RenderError::unsupported("BIT_AND_AGG", Dialect::Sqlite))
        );
    }

    #[test]
    fn test_aggregate_distinct_and_count_star() {
        let field: Field = Aggregate::new(AggregateKind::Count, col("a")).distinct().into();
        assert_eq!(render(Dialect::Default, &field), "COUNT(DISTINCT a)");
        assert_eq!(render(Dialect::Default, &count_star()), "COUNT(*)");
    }

    #[test]
    fn test_window_partition_by() {
        let window = WindowSpec::new()
            .partition_by([col("dept")])
            .order_by([SortField::desc(col("salary"))]);
        let field = sum(col("salary"));
        let Field::Aggregate(aggregate) = field else {
            unreachable!()
        };
        let field = Field::Aggregate(aggregate.over(window));
        assert_eq!(
            render(Dialect::Postgres16, &field),
            "SUM(salary) OVER (PARTITION BY dept ORDER BY salary DESC)"
        );
        assert_eq!(
            Renderer::new(Dialect::MySql57).render(&field),
            Err(RenderError::unsupported("window functions", Dialect::MySql57))
        );
    }

    #[test]
    fn test_constant_partition_is_omitted_where_rejected() {
        let window = WindowSpec::new().partition_by([inline(1)]);
        let field = Field::Aggregate(Aggregate::count_star().over(window));
        assert_eq!(render(Dialect::Postgres16, &field), "COUNT(*) OVER (PARTITION BY 1)");
        assert_eq!(render(Dialect::Firebird4, &field), "COUNT(*) OVER ()");
        assert_eq!(render(Dialect::Trino, &field), "COUNT(*) OVER ()");
    }

    #[test]
    fn test_simple_case() {
        let field: Field = Case::simple(
            col("status"),
            [(val(1), val("active")), (val(2), val("disabled"))],
            Some(val("unknown")),
        )
        .into();
        assert_eq!(
            render(Dialect::Default, &field),
            "CASE status WHEN 1 THEN 'active' WHEN 2 THEN 'disabled' ELSE 'unknown' END"
        );
    }
}
