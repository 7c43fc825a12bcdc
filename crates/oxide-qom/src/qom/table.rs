//! FROM clause entries.

use tracing::debug;

use super::condition::Condition;
use super::select::Select;
use crate::emulation;
use crate::error::{RenderError, Result};
use crate::render::{QueryPart, RenderContext};

/// Join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// `JOIN`
    Inner,
    /// `LEFT JOIN`
    Left,
    /// `RIGHT JOIN`
    Right,
    /// `FULL JOIN`
    Full,
    /// `CROSS JOIN`
    Cross,
    /// `NATURAL LEFT JOIN`
    NaturalLeft,
    /// `NATURAL RIGHT JOIN`
    NaturalRight,
}

impl JoinType {
    /// Returns the SQL keyword(s) for this join.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
            Self::Cross => "CROSS JOIN",
            Self::NaturalLeft => "NATURAL LEFT JOIN",
            Self::NaturalRight => "NATURAL RIGHT JOIN",
        }
    }

    const fn takes_condition(self) -> bool {
        !matches!(self, Self::Cross | Self::NaturalLeft | Self::NaturalRight)
    }
}

/// How the rows of a join are matched.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JoinCondition {
    /// No condition (cross and natural joins).
    #[default]
    None,
    /// `ON condition`.
    On(Condition),
    /// `USING (columns)`.
    Using(Vec<String>),
}

/// Kinds of MySQL index hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexHintKind {
    /// `USE INDEX`
    Use,
    /// `FORCE INDEX`
    Force,
    /// `IGNORE INDEX`
    Ignore,
}

/// An index hint attached to a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHint {
    kind: IndexHintKind,
    indexes: Vec<String>,
}

impl IndexHint {
    /// Creates a hint naming `indexes`.
    #[must_use]
    pub fn new<S: AsRef<str>>(kind: IndexHintKind, indexes: &[S]) -> Self {
        Self {
            kind,
            indexes: indexes.iter().map(|i| String::from(i.as_ref())).collect(),
        }
    }
}

impl QueryPart for IndexHint {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        ctx.keyword(match self.kind {
            IndexHintKind::Use => "USE INDEX (",
            IndexHintKind::Force => "FORCE INDEX (",
            IndexHintKind::Ignore => "IGNORE INDEX (",
        });
        for (i, index) in self.indexes.iter().enumerate() {
            if i > 0 {
                ctx.sql(", ");
            }
            ctx.visit_name(index);
        }
        ctx.sql(")");
        Ok(())
    }
}

/// A FROM clause entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Table {
    /// A named table or view.
    Named {
        /// Schema qualifier.
        schema: Option<String>,
        /// Table name.
        name: String,
        /// Alias.
        alias: Option<String>,
    },
    /// A subquery in FROM.
    Derived {
        /// The subquery.
        select: Box<Select>,
        /// The mandatory alias.
        alias: String,
        /// Optional column names, `AS alias(a, b)`.
        columns: Vec<String>,
    },
    /// `LATERAL table`.
    Lateral(Box<Table>),
    /// Two tables joined.
    Join {
        /// Left side.
        left: Box<Table>,
        /// Right side.
        right: Box<Table>,
        /// Join kind.
        join_type: JoinType,
        /// Join condition.
        condition: JoinCondition,
    },
    /// A table with an index hint.
    Hinted {
        /// The hinted table.
        table: Box<Table>,
        /// The hint.
        hint: IndexHint,
    },
}

impl Table {
    /// A table by name.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self::Named {
            schema: None,
            name: String::from(name),
            alias: None,
        }
    }

    /// A table qualified by schema.
    #[must_use]
    pub fn qualified(schema: &str, name: &str) -> Self {
        Self::Named {
            schema: Some(String::from(schema)),
            name: String::from(name),
            alias: None,
        }
    }

    /// A derived table.
    #[must_use]
    pub fn derived(select: Select, alias: &str) -> Self {
        Self::Derived {
            select: Box::new(select),
            alias: String::from(alias),
            columns: Vec::new(),
        }
    }

    /// `LATERAL table`.
    #[must_use]
    pub fn lateral(table: Self) -> Self {
        Self::Lateral(Box::new(table))
    }

    /// Sets the alias of a named or derived table. Other tables are
    /// returned unchanged.
    #[must_use]
    pub fn alias(self, alias: &str) -> Self {
        match self {
            Self::Named { schema, name, .. } => Self::Named {
                schema,
                name,
                alias: Some(String::from(alias)),
            },
            Self::Derived {
                select, columns, ..
            } => Self::Derived {
                select,
                alias: String::from(alias),
                columns,
            },
            other => other,
        }
    }

    /// Sets the derived column list of a derived table. Other tables are
    /// returned unchanged.
    #[must_use]
    pub fn with_columns<S: AsRef<str>>(self, names: &[S]) -> Self {
        match self {
            Self::Derived { select, alias, .. } => Self::Derived {
                select,
                alias,
                columns: names.iter().map(|n| String::from(n.as_ref())).collect(),
            },
            other => other,
        }
    }

    /// Attaches an index hint.
    #[must_use]
    pub fn with_hint(self, hint: IndexHint) -> Self {
        Self::Hinted {
            table: Box::new(self),
            hint,
        }
    }

    /// Joins `right` with an explicit join type and condition.
    #[must_use]
    pub fn join_with(self, join_type: JoinType, right: Self, condition: JoinCondition) -> Self {
        Self::Join {
            left: Box::new(self),
            right: Box::new(right),
            join_type,
            condition,
        }
    }

    /// `self JOIN right ON on`.
    #[must_use]
    pub fn join(self, right: Self, on: Condition) -> Self {
        self.join_with(JoinType::Inner, right, JoinCondition::On(on))
    }

    /// `self LEFT JOIN right ON on`.
    #[must_use]
    pub fn left_join(self, right: Self, on: Condition) -> Self {
        self.join_with(JoinType::Left, right, JoinCondition::On(on))
    }

    /// `self RIGHT JOIN right ON on`.
    #[must_use]
    pub fn right_join(self, right: Self, on: Condition) -> Self {
        self.join_with(JoinType::Right, right, JoinCondition::On(on))
    }

    /// `self FULL JOIN right ON on`.
    #[must_use]
    pub fn full_join(self, right: Self, on: Condition) -> Self {
        self.join_with(JoinType::Full, right, JoinCondition::On(on))
    }

    /// `self CROSS JOIN right`.
    #[must_use]
    pub fn cross_join(self, right: Self) -> Self {
        self.join_with(JoinType::Cross, right, JoinCondition::None)
    }

    /// `self JOIN right USING (columns)`.
    #[must_use]
    pub fn join_using<S: AsRef<str>>(self, right: Self, columns: &[S]) -> Self {
        let columns = columns.iter().map(|c| String::from(c.as_ref())).collect();
        self.join_with(JoinType::Inner, right, JoinCondition::Using(columns))
    }

    /// Appends the names this entry makes visible to the enclosing query:
    /// aliases where present, table names otherwise.
    pub(crate) fn declared_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Named { name, alias, .. } => out.push(alias.as_deref().unwrap_or(name)),
            Self::Derived { alias, .. } => out.push(alias),
            Self::Lateral(table) | Self::Hinted { table, .. } => table.declared_names(out),
            Self::Join { left, right, .. } => {
                left.declared_names(out);
                right.declared_names(out);
            }
        }
    }
}

fn render_derived(
    ctx: &mut RenderContext,
    select: &Select,
    alias: &str,
    columns: &[String],
) -> Result<()> {
    let dialect = ctx.dialect();
    if columns.is_empty() || emulation::derived_column_list(dialect) {
        ctx.visit_subquery(select)?;
        ctx.keyword(" AS ").visit_name(alias);
        if !columns.is_empty() {
            ctx.sql("(");
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    ctx.sql(", ");
                }
                ctx.visit_name(column);
            }
            ctx.sql(")");
        }
        return Ok(());
    }
    debug!(dialect = %dialect, alias, "Moving derived column list into the select list");
    let realiased = select
        .with_field_aliases(columns, || ctx.fresh_alias("q"))
        .ok_or_else(|| RenderError::unsupported("derived column list", dialect))?;
    ctx.visit_subquery(&realiased)?;
    ctx.keyword(" AS ").visit_name(alias);
    Ok(())
}

impl QueryPart for Table {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        match self {
            Self::Named {
                schema,
                name,
                alias,
            } => {
                if let Some(schema) = schema {
                    ctx.visit_name(schema).sql(".");
                }
                ctx.visit_name(name);
                if let Some(alias) = alias {
                    ctx.keyword(" AS ").visit_name(alias);
                }
                Ok(())
            }
            Self::Derived {
                select,
                alias,
                columns,
            } => render_derived(ctx, select, alias, columns),
            Self::Lateral(table) => {
                if !emulation::lateral(ctx.dialect()) {
                    return Err(RenderError::unsupported("LATERAL", ctx.dialect()));
                }
                ctx.keyword("LATERAL ");
                ctx.visit(table.as_ref())
            }
            Self::Join {
                left,
                right,
                join_type,
                condition,
            } => {
                ctx.visit(left.as_ref())?;
                ctx.sql(" ").keyword(join_type.as_str()).sql(" ");
                if matches!(**right, Self::Join { .. }) {
                    ctx.sql("(");
                    ctx.visit(right.as_ref())?;
                    ctx.sql(")");
                } else {
                    ctx.visit(right.as_ref())?;
                }
                if !join_type.takes_condition() {
                    return Ok(());
                }
                match condition {
                    JoinCondition::None => {}
                    JoinCondition::On(on) => {
                        ctx.keyword(" ON ");
                        ctx.visit(on)?;
                    }
                    JoinCondition::Using(columns) => {
                        ctx.keyword(" USING (");
                        for (i, column) in columns.iter().enumerate() {
                            if i > 0 {
                                ctx.sql(", ");
                            }
                            ctx.visit_name(column);
                        }
                        ctx.sql(")");
                    }
                }
                Ok(())
            }
            Self::Hinted { table, hint } => {
                ctx.visit(table.as_ref())?;
                if emulation::index_hints(ctx.dialect()) {
                    ctx.sql(" ");
                    ctx.visit(hint)?;
                } else {
                    debug!(dialect = %ctx.dialect(), "Omitting index hint");
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::qom::{col, qualified, Select};
    use crate::render::Renderer;

    fn render(dialect: Dialect, table: &Table) -> String {
        Renderer::new(dialect).render_inlined(table).unwrap()
    }

    #[test]
    fn test_named_tables() {
        assert_eq!(render(Dialect::Default, &Table::named("users")), "users");
        assert_eq!(
            render(Dialect::Default, &Table::qualified("app", "users").alias("u")),
            "app.users AS u"
        );
    }

    #[test]
    fn test_joins() {
        let table = Table::named("a")
            .left_join(Table::named("b"), qualified("a", "id").eq(qualified("b", "a_id")))
            .cross_join(Table::named("c"))
            .join_using(Table::named("d"), &["id"]);
        assert_eq!(
            render(Dialect::Default, &table),
            "a LEFT JOIN b ON a.id = b.a_id CROSS JOIN c JOIN d USING (id)"
        );
        let natural = Table::named("a").join_with(
            JoinType::NaturalLeft,
            Table::named("b"),
            JoinCondition::None,
        );
        assert_eq!(render(Dialect::Default, &natural), "a NATURAL LEFT JOIN b");
    }

    #[test]
    fn test_derived_column_list() {
        let select = Select::new([col("x"), col("y")]).from(Table::named("src"));
        let table = Table::derived(select, "t").with_columns(&["a", "b"]);
        assert_eq!(
            render(Dialect::Postgres16, &table),
            "(SELECT x, y FROM src) AS t(a, b)"
        );
        assert_eq!(
            render(Dialect::Sqlite, &table),
            "(SELECT x AS a, y AS b FROM src) AS t"
        );
    }

    #[test]
    fn test_derived_column_list_arity_mismatch() {
        let select = Select::new([col("x")]).from(Table::named("src"));
        let table = Table::derived(select, "t").with_columns(&["a", "b"]);
        assert_eq!(
            Renderer::new(Dialect::MySql57).render(&table),
            Err(RenderError::unsupported("derived column list", Dialect::MySql57))
        );
    }

    #[test]
    fn test_lateral() {
        let select = Select::new([col("x")]).from(Table::named("src"));
        let table = Table::named("a").cross_join(Table::lateral(Table::derived(select, "l")));
        assert_eq!(
            render(Dialect::Postgres16, &table),
            "a CROSS JOIN LATERAL (SELECT x FROM src) AS l"
        );
        assert_eq!(
            Renderer::new(Dialect::Firebird3).render(&table),
            Err(RenderError::unsupported("LATERAL", Dialect::Firebird3))
        );
        assert_eq!(
            render(Dialect::Firebird4, &table),
            "a CROSS JOIN LATERAL (SELECT x FROM src) AS l"
        );
    }

    #[test]
    fn test_index_hints_only_for_mysql() {
        let table = Table::named("users").with_hint(IndexHint::new(IndexHintKind::Force, &["idx_email"]));
        assert_eq!(render(Dialect::MySql8, &table), "users FORCE INDEX (idx_email)");
        assert_eq!(render(Dialect::MariaDb, &table), "users FORCE INDEX (idx_email)");
        assert_eq!(render(Dialect::Postgres16, &table), "users");
    }

    #[test]
    fn test_declared_names() {
        let table = Table::named("a")
            .alias("x")
            .join(Table::named("b"), col("p").eq(col("q")));
        let mut names = Vec::new();
        table.declared_names(&mut names);
        assert_eq!(names, vec!["x", "b"]);
    }
}
