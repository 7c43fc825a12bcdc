//! Value expressions.

use core::ops;

use tracing::debug;

use super::condition::{ComparisonOp, Condition};
use super::functions::{Aggregate, Case, Coalesce, FunctionCall, Greatest, Least};
use super::json::{JsonArray, JsonObject, JsonValue};
use super::raw::RawSql;
use super::select::Select;
use super::types::DataType;
use crate::emulation::{self, ConditionFieldStrategy, OperatorStrategy};
use crate::error::{RenderError, Result};
use crate::render::{QueryPart, RenderContext, RenderFlags};
use crate::value::{SqlValue, ToSqlValue};

/// Creates an unqualified column reference.
#[must_use]
pub fn col(name: &str) -> Field {
    Field::Column(ColumnRef::new(None, name))
}

/// Creates a column reference qualified with a table name or alias.
#[must_use]
pub fn qualified(table: &str, name: &str) -> Field {
    Field::Column(ColumnRef::new(Some(table), name))
}

/// Creates a bind value.
#[must_use]
pub fn val<T: ToSqlValue>(value: T) -> Field {
    Field::Value(value.to_sql_value())
}

/// Creates a literal that is always inlined.
#[must_use]
pub fn inline<T: ToSqlValue>(value: T) -> Field {
    Field::Inline(Literal::new(value.to_sql_value()))
}

/// A column reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    table: Option<String>,
    name: String,
    data_type: DataType,
}

impl ColumnRef {
    /// Creates a column reference of unknown type.
    #[must_use]
    pub fn new(table: Option<&str>, name: &str) -> Self {
        Self {
            table: table.map(String::from),
            name: String::from(name),
            data_type: DataType::Other,
        }
    }

    /// Sets the declared type of the column.
    #[must_use]
    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    /// The table qualifier.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// The column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type.
    #[must_use]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }
}

impl QueryPart for ColumnRef {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        if let Some(table) = &self.table {
            ctx.visit_name(table).sql(".");
        }
        ctx.visit_name(&self.name);
        Ok(())
    }
}

/// A literal rendered inline, with an explicit type so that NULL stays typed.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    value: SqlValue,
    data_type: DataType,
}

impl Literal {
    /// Creates a literal typed after its value.
    #[must_use]
    pub const fn new(value: SqlValue) -> Self {
        let data_type = value.data_type();
        Self { value, data_type }
    }

    /// Creates a typed NULL.
    #[must_use]
    pub const fn null(data_type: DataType) -> Self {
        Self {
            value: SqlValue::Null,
            data_type,
        }
    }

    /// The value.
    #[must_use]
    pub const fn value(&self) -> &SqlValue {
        &self.value
    }

    /// The type.
    #[must_use]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }
}

impl QueryPart for Literal {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        ctx.inline_value(&self.value);
        Ok(())
    }
}

/// Binary value operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// Remainder.
    Mod,
    /// String concatenation.
    Concat,
    /// Bitwise AND.
    BitAnd,
    /// Bitwise OR.
    BitOr,
}

impl ArithmeticOp {
    /// Returns the precedence of the operator (higher = binds tighter).
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::BitOr => 5,
            Self::BitAnd => 6,
            Self::Add | Self::Sub | Self::Concat => 8,
            Self::Mul | Self::Div | Self::Mod => 9,
        }
    }

    const fn construct(self) -> &'static str {
        match self {
            Self::Add => "addition",
            Self::Sub => "subtraction",
            Self::Mul => "multiplication",
            Self::Div => "division",
            Self::Mod => "MOD",
            Self::Concat => "concatenation",
            Self::BitAnd => "BIT_AND",
            Self::BitOr => "BIT_OR",
        }
    }

    fn strategy(self, ctx: &RenderContext) -> OperatorStrategy {
        let dialect = ctx.dialect();
        match self {
            Self::Add => OperatorStrategy::Operator("+"),
            Self::Sub => OperatorStrategy::Operator("-"),
            Self::Mul => OperatorStrategy::Operator("*"),
            Self::Div => OperatorStrategy::Operator("/"),
            Self::Mod => emulation::modulo(dialect),
            Self::Concat => emulation::concat(dialect),
            Self::BitAnd => emulation::bit_and(dialect),
            Self::BitOr => emulation::bit_or(dialect),
        }
    }
}

/// A value expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// A column reference.
    Column(ColumnRef),
    /// A bind value.
    Value(SqlValue),
    /// An inlined literal.
    Inline(Literal),
    /// A binary operator.
    Arithmetic {
        /// Left operand.
        left: Box<Field>,
        /// Operator.
        op: ArithmeticOp,
        /// Right operand.
        right: Box<Field>,
    },
    /// Unary minus.
    Neg(Box<Field>),
    /// Bitwise NOT.
    BitNot(Box<Field>),
    /// `GREATEST(...)`.
    Greatest(Greatest),
    /// `LEAST(...)`.
    Least(Least),
    /// `COALESCE(...)`.
    Coalesce(Coalesce),
    /// A plain function call.
    Function(FunctionCall),
    /// An aggregate or window function.
    Aggregate(Aggregate),
    /// A CASE expression.
    Case(Case),
    /// `CAST(field AS type)`.
    Cast {
        /// The value to convert.
        field: Box<Field>,
        /// The target type.
        data_type: DataType,
    },
    /// A scalar subquery.
    Subquery(Box<Select>),
    /// A condition used as a boolean value.
    Condition(Box<Condition>),
    /// `JSON_OBJECT(...)`.
    JsonObject(JsonObject),
    /// `JSON_ARRAY(...)`.
    JsonArray(JsonArray),
    /// `JSON_VALUE(...)`.
    JsonValue(JsonValue),
    /// A row value. Flattens into its members in select lists.
    Row(Vec<Field>),
    /// A field with an alias.
    Aliased {
        /// The aliased field.
        field: Box<Field>,
        /// The alias.
        alias: String,
    },
    /// A raw SQL template.
    Raw(RawSql),
}

impl Field {
    /// Creates a NULL literal of the given type.
    #[must_use]
    pub const fn null(data_type: DataType) -> Self {
        Self::Inline(Literal::null(data_type))
    }

    /// Creates a row value.
    #[must_use]
    pub fn row(fields: impl IntoIterator<Item = Self>) -> Self {
        Self::Row(fields.into_iter().collect())
    }

    /// Creates a scalar subquery.
    #[must_use]
    pub fn subquery(select: Select) -> Self {
        Self::Subquery(Box::new(select))
    }

    /// Creates a raw SQL template field.
    #[must_use]
    pub fn raw(template: &str, substitutes: impl IntoIterator<Item = Self>) -> Self {
        Self::Raw(RawSql::new(template, substitutes))
    }

    fn binary(self, op: ArithmeticOp, other: Self) -> Self {
        Self::Arithmetic {
            left: Box::new(self),
            op,
            right: Box::new(other),
        }
    }

    /// String concatenation.
    #[must_use]
    pub fn concat(self, other: Self) -> Self {
        self.binary(ArithmeticOp::Concat, other)
    }

    /// `CAST(self AS data_type)`.
    #[must_use]
    pub fn cast(self, data_type: DataType) -> Self {
        Self::Cast {
            field: Box::new(self),
            data_type,
        }
    }

    /// Gives the field an alias.
    #[must_use]
    pub fn alias(self, alias: &str) -> Self {
        Self::Aliased {
            field: Box::new(self),
            alias: String::from(alias),
        }
    }

    fn compare(self, op: ComparisonOp, other: Self) -> Condition {
        Condition::Compare {
            left: Box::new(self),
            op,
            right: Box::new(other),
        }
    }

    /// `self = other`.
    #[must_use]
    pub fn eq(self, other: Self) -> Condition {
        self.compare(ComparisonOp::Eq, other)
    }

    /// `self <> other`.
    #[must_use]
    pub fn not_eq(self, other: Self) -> Condition {
        self.compare(ComparisonOp::NotEq, other)
    }

    /// `self < other`.
    #[must_use]
    pub fn lt(self, other: Self) -> Condition {
        self.compare(ComparisonOp::Lt, other)
    }

    /// `self <= other`.
    #[must_use]
    pub fn lt_eq(self, other: Self) -> Condition {
        self.compare(ComparisonOp::LtEq, other)
    }

    /// `self > other`.
    #[must_use]
    pub fn gt(self, other: Self) -> Condition {
        self.compare(ComparisonOp::Gt, other)
    }

    /// `self >= other`.
    #[must_use]
    pub fn gt_eq(self, other: Self) -> Condition {
        self.compare(ComparisonOp::GtEq, other)
    }

    /// `self LIKE pattern`.
    #[must_use]
    pub fn like(self, pattern: Self) -> Condition {
        self.compare(ComparisonOp::Like, pattern)
    }

    /// `self NOT LIKE pattern`.
    #[must_use]
    pub fn not_like(self, pattern: Self) -> Condition {
        self.compare(ComparisonOp::NotLike, pattern)
    }

    /// `self IS NULL`. A scalar subquery becomes a subquery null test.
    #[must_use]
    pub fn is_null(self) -> Condition {
        self.null_test(false)
    }

    /// `self IS NOT NULL`. A scalar subquery becomes a subquery null test.
    #[must_use]
    pub fn is_not_null(self) -> Condition {
        self.null_test(true)
    }

    fn null_test(self, negated: bool) -> Condition {
        match self {
            Self::Subquery(select) => Condition::SelectIsNull { select, negated },
            field => Condition::IsNull {
                field: Box::new(field),
                negated,
            },
        }
    }

    /// `self BETWEEN low AND high`.
    #[must_use]
    pub fn between(self, low: Self, high: Self) -> Condition {
        Condition::Between {
            field: Box::new(self),
            low: Box::new(low),
            high: Box::new(high),
            negated: false,
        }
    }

    /// `self NOT BETWEEN low AND high`.
    #[must_use]
    pub fn not_between(self, low: Self, high: Self) -> Condition {
        Condition::Between {
            field: Box::new(self),
            low: Box::new(low),
            high: Box::new(high),
            negated: true,
        }
    }

    /// `self IN (list)`.
    #[must_use]
    pub fn in_list(self, list: impl IntoIterator<Item = Self>) -> Condition {
        Condition::In {
            field: Box::new(self),
            list: list.into_iter().collect(),
            negated: false,
        }
    }

    /// `self NOT IN (list)`.
    #[must_use]
    pub fn not_in_list(self, list: impl IntoIterator<Item = Self>) -> Condition {
        Condition::In {
            field: Box::new(self),
            list: list.into_iter().collect(),
            negated: true,
        }
    }

    /// Returns the field without its alias.
    #[must_use]
    pub fn unaliased(&self) -> &Self {
        match self {
            Self::Aliased { field, .. } => field.unaliased(),
            other => other,
        }
    }

    /// Returns the alias, if any.
    #[must_use]
    pub fn alias_name(&self) -> Option<&str> {
        match self {
            Self::Aliased { alias, .. } => Some(alias),
            _ => None,
        }
    }

    /// Returns whether the field is a bind value or literal.
    #[must_use]
    pub const fn is_constant(&self) -> bool {
        matches!(self, Self::Value(_) | Self::Inline(_))
    }

    /// Returns whether the rendered field needs no parentheses when used as
    /// the operand of a prefix operator.
    const fn is_atomic(&self) -> bool {
        matches!(
            self,
            Self::Column(_)
                | Self::Greatest(_)
                | Self::Least(_)
                | Self::Coalesce(_)
                | Self::Function(_)
                | Self::Aggregate(_)
                | Self::Case(_)
                | Self::Cast { .. }
                | Self::Subquery(_)
                | Self::JsonObject(_)
                | Self::JsonArray(_)
                | Self::JsonValue(_)
                | Self::Row(_)
        )
    }

    /// Appends the members of this field as they appear in a select list:
    /// row values expand recursively, everything else stands for itself.
    pub(crate) fn flatten_into(&self, out: &mut Vec<Self>) {
        match self {
            Self::Row(fields) => {
                for field in fields {
                    field.flatten_into(out);
                }
            }
            Self::Aliased { field, .. } if matches!(**field, Self::Row(_)) => {
                field.flatten_into(out);
            }
            other => out.push(other.clone()),
        }
    }

    /// Infers the type of the field on a best-effort basis.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Column(column) => column.data_type().clone(),
            Self::Value(value) => value.data_type(),
            Self::Inline(literal) => literal.data_type().clone(),
            Self::Arithmetic { op: ArithmeticOp::Concat, .. } => DataType::Varchar(None),
            Self::Arithmetic { left, right, .. } => first_known([left.as_ref(), right.as_ref()]),
            Self::Neg(field) | Self::BitNot(field) => field.data_type(),
            Self::Greatest(g) => first_known(g.args()),
            Self::Least(l) => first_known(l.args()),
            Self::Coalesce(c) => first_known(c.args()),
            Self::Function(_) | Self::Row(_) | Self::Raw(_) => DataType::Other,
            Self::Aggregate(aggregate) => aggregate.data_type(),
            Self::Case(case) => first_known(case.results()),
            Self::Cast { data_type, .. } => data_type.clone(),
            Self::Subquery(select) => match select.flattened_fields().as_slice() {
                [single] => single.data_type(),
                _ => DataType::Other,
            },
            Self::Condition(_) => DataType::Boolean,
            Self::JsonObject(_) | Self::JsonArray(_) => DataType::Json,
            Self::JsonValue(value) => value.returning().cloned().unwrap_or_default(),
            Self::Aliased { field, .. } => field.data_type(),
        }
    }

    /// Rewrites the tree bottom-up: children are transformed first, the node
    /// is rebuilt from the results, then `f` is applied to it. Subqueries are
    /// not entered.
    #[must_use]
    pub fn transform<F: FnMut(Self) -> Self>(&self, f: &mut F) -> Self {
        let rebuilt = match self {
            Self::Column(_) | Self::Value(_) | Self::Inline(_) | Self::Subquery(_) => self.clone(),
            Self::Arithmetic { left, op, right } => Self::Arithmetic {
                left: Box::new(left.transform(f)),
                op: *op,
                right: Box::new(right.transform(f)),
            },
            Self::Neg(field) => Self::Neg(Box::new(field.transform(f))),
            Self::BitNot(field) => Self::BitNot(Box::new(field.transform(f))),
            Self::Greatest(g) => Self::Greatest(g.with_args(transform_all(g.args(), f))),
            Self::Least(l) => Self::Least(l.with_args(transform_all(l.args(), f))),
            Self::Coalesce(c) => Self::Coalesce(c.with_args(transform_all(c.args(), f))),
            Self::Function(call) => Self::Function(call.with_args(transform_all(call.args(), f))),
            Self::Aggregate(aggregate) => Self::Aggregate(aggregate.map_fields(f)),
            Self::Case(case) => Self::Case(case.map_fields(f)),
            Self::Cast { field, data_type } => Self::Cast {
                field: Box::new(field.transform(f)),
                data_type: data_type.clone(),
            },
            Self::Condition(condition) => Self::Condition(Box::new(condition.map_fields(f))),
            Self::JsonObject(object) => Self::JsonObject(object.map_fields(f)),
            Self::JsonArray(array) => {
                Self::JsonArray(array.with_elements(transform_all(array.elements(), f)))
            }
            Self::JsonValue(value) => Self::JsonValue(value.map_fields(f)),
            Self::Row(fields) => Self::Row(transform_all(fields, f)),
            Self::Aliased { field, alias } => Self::Aliased {
                field: Box::new(field.transform(f)),
                alias: alias.clone(),
            },
            Self::Raw(raw) => Self::Raw(raw.with_substitutes(transform_all(raw.substitutes(), f))),
        };
        f(rebuilt)
    }
}

pub(crate) fn transform_all<F: FnMut(Field) -> Field>(fields: &[Field], f: &mut F) -> Vec<Field> {
    fields.iter().map(|field| field.transform(f)).collect()
}

pub(crate) fn first_known<'a>(fields: impl IntoIterator<Item = &'a Field>) -> DataType {
    fields
        .into_iter()
        .map(Field::data_type)
        .find(DataType::is_known)
        .unwrap_or_default()
}

macro_rules! impl_field_op {
    ($($trait:ident :: $method:ident => $op:ident),+ $(,)?) => {
        $(
            impl ops::$trait for Field {
                type Output = Self;

                fn $method(self, other: Self) -> Self {
                    self.binary(ArithmeticOp::$op, other)
                }
            }
        )+
    };
}

impl_field_op!(
    Add::add => Add,
    Sub::sub => Sub,
    Mul::mul => Mul,
    Div::div => Div,
    Rem::rem => Mod,
    BitAnd::bitand => BitAnd,
    BitOr::bitor => BitOr,
);

impl ops::Neg for Field {
    type Output = Self;

    fn neg(self) -> Self {
        Self::Neg(Box::new(self))
    }
}

/// Bitwise NOT, as `!` does for integers.
impl ops::Not for Field {
    type Output = Self;

    fn not(self) -> Self {
        Self::BitNot(Box::new(self))
    }
}

impl From<Condition> for Field {
    fn from(condition: Condition) -> Self {
        Self::Condition(Box::new(condition))
    }
}

impl From<ColumnRef> for Field {
    fn from(column: ColumnRef) -> Self {
        Self::Column(column)
    }
}

impl From<SqlValue> for Field {
    fn from(value: SqlValue) -> Self {
        Self::Value(value)
    }
}

impl QueryPart for Field {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        match self {
            Self::Column(column) => ctx.visit(column),
            Self::Value(value) => {
                ctx.bind_value(value);
                Ok(())
            }
            Self::Inline(literal) => ctx.visit(literal),
            Self::Arithmetic { left, op, right } => render_arithmetic(ctx, left, *op, right),
            Self::Neg(field) => render_prefix(ctx, "-", field),
            Self::BitNot(field) => match emulation::bit_not(ctx.dialect()) {
                OperatorStrategy::Operator(op) => render_prefix(ctx, op, field),
                OperatorStrategy::Function(name) => {
                    ctx.sql(name).sql("(");
                    ctx.visit(field.as_ref())?;
                    ctx.sql(")");
                    Ok(())
                }
                OperatorStrategy::Unsupported => {
                    Err(RenderError::unsupported("bitwise NOT", ctx.dialect()))
                }
            },
            Self::Greatest(g) => ctx.visit(g),
            Self::Least(l) => ctx.visit(l),
            Self::Coalesce(c) => ctx.visit(c),
            Self::Function(call) => ctx.visit(call),
            Self::Aggregate(aggregate) => ctx.visit(aggregate),
            Self::Case(case) => ctx.visit(case),
            Self::Cast { field, data_type } => {
                let target = data_type.cast_target(ctx.dialect());
                ctx.keyword("CAST(");
                ctx.visit(field.as_ref())?;
                ctx.keyword(" AS ").sql(&target).sql(")");
                Ok(())
            }
            Self::Subquery(select) => ctx.visit_subquery(select.as_ref()),
            Self::Condition(condition) => render_condition_field(ctx, condition),
            Self::JsonObject(object) => ctx.visit(object),
            Self::JsonArray(array) => ctx.visit(array),
            Self::JsonValue(value) => ctx.visit(value),
            Self::Row(fields) => {
                ctx.sql("(");
                ctx.visit_all(fields, ", ")?;
                ctx.sql(")");
                Ok(())
            }
            Self::Aliased { field, alias } => {
                let flags = ctx.flags();
                if flags.declare_fields {
                    let inner = RenderFlags {
                        declare_fields: false,
                        ..flags
                    };
                    ctx.with_flags(inner, |ctx| ctx.visit(field.as_ref()))?;
                    ctx.keyword(" AS ");
                }
                ctx.visit_name(alias);
                Ok(())
            }
            Self::Raw(raw) => ctx.visit(raw),
        }
    }
}

fn render_arithmetic(
    ctx: &mut RenderContext,
    left: &Field,
    op: ArithmeticOp,
    right: &Field,
) -> Result<()> {
    match op.strategy(ctx) {
        OperatorStrategy::Operator(symbol) => {
            render_operand(ctx, left, op, false)?;
            ctx.sql(" ").sql(symbol).sql(" ");
            render_operand(ctx, right, op, true)
        }
        OperatorStrategy::Function(name) => {
            debug!(dialect = %ctx.dialect(), function = name, "Rendering operator as function");
            ctx.sql(name).sql("(");
            ctx.visit(left)?;
            ctx.sql(", ");
            ctx.visit(right)?;
            ctx.sql(")");
            Ok(())
        }
        OperatorStrategy::Unsupported => Err(RenderError::unsupported(op.construct(), ctx.dialect())),
    }
}

fn render_operand(
    ctx: &mut RenderContext,
    operand: &Field,
    parent: ArithmeticOp,
    right_side: bool,
) -> Result<()> {
    let wrap = match operand {
        Field::Arithmetic { op, .. } => {
            op.precedence() < parent.precedence()
                || (right_side && op.precedence() == parent.precedence())
        }
        Field::Condition(_) => true,
        _ => false,
    };
    if wrap {
        ctx.sql("(");
        ctx.visit(operand)?;
        ctx.sql(")");
        Ok(())
    } else {
        ctx.visit(operand)
    }
}

fn render_prefix(ctx: &mut RenderContext, op: &str, operand: &Field) -> Result<()> {
    ctx.sql(op);
    if operand.is_atomic() {
        ctx.visit(operand)
    } else {
        ctx.sql("(");
        ctx.visit(operand)?;
        ctx.sql(")");
        Ok(())
    }
}

fn render_condition_field(ctx: &mut RenderContext, condition: &Condition) -> Result<()> {
    match emulation::condition_as_field(ctx.dialect()) {
        ConditionFieldStrategy::Native => ctx.visit(condition),
        ConditionFieldStrategy::CaseEmulation => {
            debug!(dialect = %ctx.dialect(), "Emulating condition as field with CASE");
            let case = Case::searched(
                [
                    (condition.clone(), inline(true)),
                    (!condition.clone(), inline(false)),
                ],
                None,
            );
            ctx.visit(&case)
        }
    }
}
