//! Predicates.

use core::ops;

use tracing::debug;

use super::field::{inline, qualified, transform_all, Field};
use super::functions::count_star;
use super::raw::RawSql;
use super::select::Select;
use super::table::Table;
use crate::emulation::{self, BooleanLiteral, NullTestStrategy, XorStrategy};
use crate::error::{RenderError, Result};
use crate::render::{QueryPart, RenderContext};
use crate::value::SqlValue;

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    /// `=`
    Eq,
    /// `<>`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
}

impl ComparisonOp {
    /// Returns the SQL operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
        }
    }
}

/// Logical connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `AND`
    And,
    /// `OR`
    Or,
}

impl Combinator {
    const fn keyword(self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }

    // The result of combining zero conditions.
    const fn identity(self) -> &'static str {
        match self {
            Self::And => "1 = 1",
            Self::Or => "1 = 0",
        }
    }
}

/// How the document is passed to `XMLEXISTS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlPassingMechanism {
    /// `PASSING BY REF`
    ByRef,
    /// `PASSING BY VALUE`
    ByValue,
}

/// `XMLEXISTS(xpath PASSING document)`.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlExists {
    xpath: String,
    document: Box<Field>,
    mechanism: Option<XmlPassingMechanism>,
}

impl XmlExists {
    /// Creates the predicate with the dialect's default passing mechanism.
    #[must_use]
    pub fn new(xpath: &str, document: Field) -> Self {
        Self {
            xpath: String::from(xpath),
            document: Box::new(document),
            mechanism: None,
        }
    }

    /// Sets an explicit passing mechanism.
    #[must_use]
    pub const fn passing(mut self, mechanism: XmlPassingMechanism) -> Self {
        self.mechanism = Some(mechanism);
        self
    }

    /// The XPath expression.
    #[must_use]
    pub fn xpath(&self) -> &str {
        &self.xpath
    }

    /// The XML document.
    #[must_use]
    pub fn document(&self) -> &Field {
        &self.document
    }

    fn map_fields<F: FnMut(Field) -> Field>(&self, f: &mut F) -> Self {
        Self {
            xpath: self.xpath.clone(),
            document: Box::new(self.document.transform(f)),
            mechanism: self.mechanism,
        }
    }
}

impl QueryPart for XmlExists {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        if !emulation::xml_exists(ctx.dialect()) {
            return Err(RenderError::unsupported("XMLEXISTS", ctx.dialect()));
        }
        ctx.keyword("XMLEXISTS(");
        ctx.inline_value(&SqlValue::Text(self.xpath.clone()));
        ctx.keyword(" PASSING ");
        match self.mechanism {
            Some(XmlPassingMechanism::ByRef) => {
                ctx.keyword("BY REF ");
            }
            Some(XmlPassingMechanism::ByValue) => {
                ctx.keyword("BY VALUE ");
            }
            None => {}
        }
        ctx.visit(self.document.as_ref())?;
        ctx.sql(")");
        Ok(())
    }
}

/// A predicate.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Condition {
    /// The absence of a condition. Neutral under AND and OR, skipped in
    /// WHERE and HAVING, and rendered as `1 = 1` elsewhere.
    #[default]
    NoCondition,
    /// `left op right`.
    Compare {
        /// Left operand.
        left: Box<Field>,
        /// Operator.
        op: ComparisonOp,
        /// Right operand.
        right: Box<Field>,
    },
    /// `field IS [NOT] NULL`.
    IsNull {
        /// The tested value.
        field: Box<Field>,
        /// `IS NOT NULL` when set.
        negated: bool,
    },
    /// `field [NOT] BETWEEN low AND high`.
    Between {
        /// The tested value.
        field: Box<Field>,
        /// Lower bound, inclusive.
        low: Box<Field>,
        /// Upper bound, inclusive.
        high: Box<Field>,
        /// `NOT BETWEEN` when set.
        negated: bool,
    },
    /// `field [NOT] IN (list)`.
    In {
        /// The tested value.
        field: Box<Field>,
        /// The candidates.
        list: Vec<Field>,
        /// `NOT IN` when set.
        negated: bool,
    },
    /// `[NOT] EXISTS (select)`.
    Exists {
        /// The subquery.
        select: Box<Select>,
        /// `NOT EXISTS` when set.
        negated: bool,
    },
    /// `(select) IS [NOT] NULL`, testing every column of the subquery's row.
    SelectIsNull {
        /// The subquery.
        select: Box<Select>,
        /// `IS NOT NULL` when set.
        negated: bool,
    },
    /// Conditions joined by one connective.
    Combined {
        /// The connective.
        op: Combinator,
        /// The operands, in order.
        conditions: Vec<Condition>,
    },
    /// Logical exclusive or.
    Xor(Box<Condition>, Box<Condition>),
    /// Logical negation.
    Not(Box<Condition>),
    /// `XMLEXISTS(...)`.
    XmlExists(XmlExists),
    /// A boolean field used as a condition.
    Field(Box<Field>),
    /// A raw SQL template.
    Raw(RawSql),
}

impl Condition {
    /// Joins all `conditions` with AND.
    #[must_use]
    pub fn all(conditions: impl IntoIterator<Item = Self>) -> Self {
        conditions
            .into_iter()
            .fold(Self::NoCondition, |acc, condition| acc.and(condition))
    }

    /// Joins all `conditions` with OR.
    #[must_use]
    pub fn any(conditions: impl IntoIterator<Item = Self>) -> Self {
        conditions
            .into_iter()
            .fold(Self::NoCondition, |acc, condition| acc.or(condition))
    }

    fn combine(self, op: Combinator, other: Self) -> Self {
        match (self, other) {
            (Self::NoCondition, other) => other,
            (this, Self::NoCondition) => this,
            (Self::Combined { op: current, mut conditions }, other) if current == op => {
                conditions.push(other);
                Self::Combined { op, conditions }
            }
            (this, other) => Self::Combined {
                op,
                conditions: vec![this, other],
            },
        }
    }

    /// `self AND other`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        self.combine(Combinator::And, other)
    }

    /// `self OR other`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        self.combine(Combinator::Or, other)
    }

    /// `self XOR other`.
    #[must_use]
    pub fn xor(self, other: Self) -> Self {
        Self::Xor(Box::new(self), Box::new(other))
    }

    /// `EXISTS (select)`.
    #[must_use]
    pub fn exists(select: Select) -> Self {
        Self::Exists {
            select: Box::new(select),
            negated: false,
        }
    }

    /// `NOT EXISTS (select)`.
    #[must_use]
    pub fn not_exists(select: Select) -> Self {
        Self::Exists {
            select: Box::new(select),
            negated: true,
        }
    }

    /// A boolean field used as a condition.
    #[must_use]
    pub fn field(field: Field) -> Self {
        Self::Field(Box::new(field))
    }

    /// A raw SQL template condition.
    #[must_use]
    pub fn raw(template: &str, substitutes: impl IntoIterator<Item = Field>) -> Self {
        Self::Raw(RawSql::new(template, substitutes))
    }

    /// Returns whether this is [`Condition::NoCondition`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::NoCondition)
    }

    /// Rewrites the condition tree bottom-up: nested conditions of AND, OR,
    /// XOR and NOT are transformed first, the node is rebuilt from the
    /// results, then `f` is applied to it. Subqueries are not entered.
    #[must_use]
    pub fn transform<F: FnMut(Self) -> Self>(&self, f: &mut F) -> Self {
        let rebuilt = match self {
            Self::Combined { op, conditions } => Self::Combined {
                op: *op,
                conditions: conditions.iter().map(|c| c.transform(f)).collect(),
            },
            Self::Xor(left, right) => {
                Self::Xor(Box::new(left.transform(f)), Box::new(right.transform(f)))
            }
            Self::Not(condition) => Self::Not(Box::new(condition.transform(f))),
            other => other.clone(),
        };
        f(rebuilt)
    }

    /// Rebuilds the condition with every field operand passed through
    /// [`Field::transform`]. Subqueries are not entered.
    #[must_use]
    pub fn map_fields<F: FnMut(Field) -> Field>(&self, f: &mut F) -> Self {
        match self {
            Self::NoCondition | Self::Exists { .. } | Self::SelectIsNull { .. } => self.clone(),
            Self::Compare { left, op, right } => Self::Compare {
                left: Box::new(left.transform(f)),
                op: *op,
                right: Box::new(right.transform(f)),
            },
            Self::IsNull { field, negated } => Self::IsNull {
                field: Box::new(field.transform(f)),
                negated: *negated,
            },
            Self::Between {
                field,
                low,
                high,
                negated,
            } => Self::Between {
                field: Box::new(field.transform(f)),
                low: Box::new(low.transform(f)),
                high: Box::new(high.transform(f)),
                negated: *negated,
            },
            Self::In {
                field,
                list,
                negated,
            } => Self::In {
                field: Box::new(field.transform(f)),
                list: transform_all(list, f),
                negated: *negated,
            },
            Self::Combined { op, conditions } => Self::Combined {
                op: *op,
                conditions: conditions.iter().map(|c| c.map_fields(f)).collect(),
            },
            Self::Xor(left, right) => {
                Self::Xor(Box::new(left.map_fields(f)), Box::new(right.map_fields(f)))
            }
            Self::Not(condition) => Self::Not(Box::new(condition.map_fields(f))),
            Self::XmlExists(xml) => Self::XmlExists(xml.map_fields(f)),
            Self::Field(field) => Self::Field(Box::new(field.transform(f))),
            Self::Raw(raw) => Self::Raw(raw.with_substitutes(transform_all(raw.substitutes(), f))),
        }
    }
}

impl ops::Not for Condition {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Self::NoCondition => Self::NoCondition,
            condition => Self::Not(Box::new(condition)),
        }
    }
}

impl From<XmlExists> for Condition {
    fn from(xml: XmlExists) -> Self {
        Self::XmlExists(xml)
    }
}

impl QueryPart for Condition {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        match self {
            Self::NoCondition => {
                ctx.sql(Combinator::And.identity());
                Ok(())
            }
            Self::Compare { left, op, right } => {
                render_operand(ctx, left)?;
                ctx.sql(" ").keyword(op.as_str()).sql(" ");
                render_operand(ctx, right)
            }
            Self::IsNull { field, negated } => {
                render_operand(ctx, field)?;
                ctx.keyword(if *negated { " IS NOT NULL" } else { " IS NULL" });
                Ok(())
            }
            Self::Between {
                field,
                low,
                high,
                negated,
            } => {
                render_operand(ctx, field)?;
                ctx.keyword(if *negated { " NOT BETWEEN " } else { " BETWEEN " });
                render_operand(ctx, low)?;
                ctx.keyword(" AND ");
                render_operand(ctx, high)
            }
            Self::In {
                field,
                list,
                negated,
            } => {
                if list.is_empty() {
                    // Nothing is in the empty set.
                    let op = if *negated { Combinator::And } else { Combinator::Or };
                    ctx.sql(op.identity());
                    return Ok(());
                }
                render_operand(ctx, field)?;
                ctx.keyword(if *negated { " NOT IN (" } else { " IN (" });
                ctx.visit_all(list, ", ")?;
                ctx.sql(")");
                Ok(())
            }
            Self::Exists { select, negated } => {
                ctx.keyword(if *negated { "NOT EXISTS " } else { "EXISTS " });
                ctx.visit_subquery(select.as_ref())
            }
            Self::SelectIsNull { select, negated } => render_select_is_null(ctx, select, *negated),
            Self::Combined { op, conditions } => match conditions.as_slice() {
                [] => {
                    ctx.sql(op.identity());
                    Ok(())
                }
                [single] => ctx.visit(single),
                _ => {
                    for (i, condition) in conditions.iter().enumerate() {
                        if i > 0 {
                            ctx.keyword(op.keyword());
                        }
                        let wrap = matches!(condition, Self::Combined { op: inner, .. } if inner != op);
                        if wrap {
                            ctx.sql("(");
                            ctx.visit(condition)?;
                            ctx.sql(")");
                        } else {
                            ctx.visit(condition)?;
                        }
                    }
                    Ok(())
                }
            },
            Self::Xor(left, right) => {
                let op = match emulation::xor(ctx.dialect()) {
                    XorStrategy::Native => " XOR ",
                    XorStrategy::NotEqual => " <> ",
                };
                ctx.sql("(");
                ctx.visit(left.as_ref())?;
                ctx.sql(")").keyword(op).sql("(");
                ctx.visit(right.as_ref())?;
                ctx.sql(")");
                Ok(())
            }
            Self::Not(condition) => {
                ctx.keyword("NOT (");
                ctx.visit(condition.as_ref())?;
                ctx.sql(")");
                Ok(())
            }
            Self::XmlExists(xml) => ctx.visit(xml),
            Self::Field(field) => {
                render_operand(ctx, field)?;
                if emulation::boolean_literal(ctx.dialect()) == BooleanLiteral::Numeric {
                    ctx.sql(" = 1");
                }
                Ok(())
            }
            Self::Raw(raw) => ctx.visit(raw),
        }
    }
}

// Conditions nested as field operands are parenthesized.
fn render_operand(ctx: &mut RenderContext, field: &Field) -> Result<()> {
    if matches!(field, Field::Condition(_)) {
        ctx.sql("(");
        ctx.visit(field)?;
        ctx.sql(")");
        Ok(())
    } else {
        ctx.visit(field)
    }
}

/// Renders `(select) IS [NOT] NULL`. Where row value null tests are missing,
/// counts the rows of the subquery whose every column passes the test:
/// `1 = (SELECT COUNT(*) FROM (select) AS t WHERE t.v1 IS NULL AND ...)`.
fn render_select_is_null(ctx: &mut RenderContext, select: &Select, negated: bool) -> Result<()> {
    let dialect = ctx.dialect();
    let fields = select.flattened_fields();
    match emulation::select_is_null(dialect, fields.len()) {
        NullTestStrategy::Standard => {
            ctx.visit_subquery(select)?;
            ctx.keyword(if negated { " IS NOT NULL" } else { " IS NULL" });
            Ok(())
        }
        NullTestStrategy::CountRewrite => {
            if fields.is_empty() {
                return Err(RenderError::unsupported("IS NULL over SELECT *", dialect));
            }
            debug!(dialect = %dialect, columns = fields.len(), "Rewriting subquery null test as COUNT");
            let names: Vec<String> = (1..=fields.len()).map(|i| format!("v{i}")).collect();
            let inner = select
                .with_field_aliases(&names, || ctx.fresh_alias("q"))
                .ok_or_else(|| RenderError::unsupported("IS NULL over SELECT *", dialect))?;
            let alias = ctx.fresh_alias("t");
            let predicate = Condition::all(names.iter().map(|name| {
                let column = qualified(&alias, name);
                if negated {
                    column.is_not_null()
                } else {
                    column.is_null()
                }
            }));
            let count = Select::new([count_star()])
                .from(Table::derived(inner, &alias))
                .where_clause(predicate);
            ctx.visit(&inline(1).eq(Field::subquery(count)))
        }
    }
}
