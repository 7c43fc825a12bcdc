//! SELECT statements.

use std::collections::HashSet;

use tracing::debug;

use super::condition::Condition;
use super::field::{inline, qualified, Field};
use super::functions::Case;
use super::table::Table;
use crate::dialect::Dialect;
use crate::emulation::{self, LimitStrategy, WithStrategy};
use crate::error::{RenderError, Result};
use crate::render::cte;
use crate::render::{Declaration, QueryPart, RenderContext, RenderFlags};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// Placement of NULLs in a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrdering {
    /// NULLs sort before other values.
    First,
    /// NULLs sort after other values.
    Last,
}

/// An ORDER BY entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SortField {
    field: Field,
    order: Option<SortOrder>,
    nulls: Option<NullOrdering>,
}

impl SortField {
    /// Sorts by `field` in the dialect's default direction.
    #[must_use]
    pub const fn new(field: Field) -> Self {
        Self {
            field,
            order: None,
            nulls: None,
        }
    }

    /// Sorts by `field` ascending.
    #[must_use]
    pub const fn asc(field: Field) -> Self {
        Self {
            field,
            order: Some(SortOrder::Asc),
            nulls: None,
        }
    }

    /// Sorts by `field` descending.
    #[must_use]
    pub const fn desc(field: Field) -> Self {
        Self {
            field,
            order: Some(SortOrder::Desc),
            nulls: None,
        }
    }

    /// Places NULLs first.
    #[must_use]
    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullOrdering::First);
        self
    }

    /// Places NULLs last.
    #[must_use]
    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullOrdering::Last);
        self
    }

    /// The sorted field.
    #[must_use]
    pub const fn field(&self) -> &Field {
        &self.field
    }

    /// Rebuilds the entry over a new field.
    #[must_use]
    pub fn with_field(&self, field: Field) -> Self {
        Self {
            field,
            order: self.order,
            nulls: self.nulls,
        }
    }
}

impl From<Field> for SortField {
    fn from(field: Field) -> Self {
        Self::new(field)
    }
}

impl QueryPart for SortField {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        let mut nulls = self.nulls;
        if let Some(ordering) = nulls {
            if !emulation::nulls_ordering(ctx.dialect()) {
                debug!(dialect = %ctx.dialect(), "Emulating NULLS ordering with a CASE sort key");
                let (null_key, value_key) = match ordering {
                    NullOrdering::First => (0, 1),
                    NullOrdering::Last => (1, 0),
                };
                let key = Case::searched(
                    [(self.field.clone().is_null(), inline(null_key))],
                    Some(inline(value_key)),
                );
                ctx.visit(&key)?;
                ctx.sql(", ");
                nulls = None;
            }
        }
        ctx.visit(&self.field)?;
        match self.order {
            Some(SortOrder::Asc) => {
                ctx.keyword(" ASC");
            }
            Some(SortOrder::Desc) => {
                ctx.keyword(" DESC");
            }
            None => {}
        }
        match nulls {
            Some(NullOrdering::First) => {
                ctx.keyword(" NULLS FIRST");
            }
            Some(NullOrdering::Last) => {
                ctx.keyword(" NULLS LAST");
            }
            None => {}
        }
        Ok(())
    }
}

/// A named subquery in a WITH clause.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonTableExpression {
    name: String,
    columns: Vec<String>,
    select: Box<Select>,
}

impl CommonTableExpression {
    /// Creates `name AS (select)`.
    #[must_use]
    pub fn new(name: &str, select: Select) -> Self {
        Self {
            name: String::from(name),
            columns: Vec::new(),
            select: Box::new(select),
        }
    }

    /// Sets the column list, `name(a, b) AS (...)`.
    #[must_use]
    pub fn with_columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.columns = columns.iter().map(|c| String::from(c.as_ref())).collect();
        self
    }

    /// The name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The defining query.
    #[must_use]
    pub fn select(&self) -> &Select {
        &self.select
    }
}

impl QueryPart for CommonTableExpression {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        ctx.visit_name(&self.name);
        if !self.columns.is_empty() {
            ctx.sql("(");
            for (i, column) in self.columns.iter().enumerate() {
                if i > 0 {
                    ctx.sql(", ");
                }
                ctx.visit_name(column);
            }
            ctx.sql(")");
        }
        ctx.keyword(" AS ");
        ctx.visit_subquery(self.select.as_ref())
    }
}

/// A WITH clause.
#[derive(Debug, Clone, PartialEq)]
pub struct With {
    recursive: bool,
    ctes: Vec<CommonTableExpression>,
}

impl With {
    /// `WITH ctes`.
    #[must_use]
    pub fn new(ctes: impl IntoIterator<Item = CommonTableExpression>) -> Self {
        Self {
            recursive: false,
            ctes: ctes.into_iter().collect(),
        }
    }

    /// `WITH RECURSIVE ctes`.
    #[must_use]
    pub fn recursive(ctes: impl IntoIterator<Item = CommonTableExpression>) -> Self {
        Self {
            recursive: true,
            ..Self::new(ctes)
        }
    }

    /// Whether the clause is recursive.
    #[must_use]
    pub const fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// The common table expressions, in declaration order.
    #[must_use]
    pub fn ctes(&self) -> &[CommonTableExpression] {
        &self.ctes
    }
}

/// Renders `WITH [RECURSIVE] cte, ...`, declaring each name in the current
/// scope.
pub(crate) fn render_with<'a>(
    ctx: &mut RenderContext,
    recursive: bool,
    ctes: impl IntoIterator<Item = &'a CommonTableExpression>,
) -> Result<()> {
    ctx.keyword(if recursive { "WITH RECURSIVE " } else { "WITH " });
    for (i, cte) in ctes.into_iter().enumerate() {
        if ctx.scope().get_current_scope(cte.name()) == Some(&Declaration::Cte) {
            return Err(RenderError::DuplicateCte(String::from(cte.name())));
        }
        ctx.declare(cte.name(), Declaration::Cte);
        if i > 0 {
            ctx.sql(", ");
        }
        ctx.visit(cte)?;
    }
    Ok(())
}

/// A SELECT statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    with: Option<With>,
    distinct: bool,
    fields: Vec<Field>,
    from: Vec<Table>,
    condition: Condition,
    group_by: Vec<Field>,
    having: Condition,
    order_by: Vec<SortField>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Select {
    /// `SELECT fields`. An empty list renders as `*`.
    #[must_use]
    pub fn new(fields: impl IntoIterator<Item = Field>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Attaches a WITH clause.
    #[must_use]
    pub fn with(mut self, with: With) -> Self {
        self.with = Some(with);
        self
    }

    /// `SELECT DISTINCT`.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Adds a FROM entry.
    #[must_use]
    pub fn from(mut self, table: Table) -> Self {
        self.from.push(table);
        self
    }

    /// Adds a WHERE condition, joined with AND to any existing one.
    #[must_use]
    pub fn where_clause(mut self, condition: Condition) -> Self {
        self.condition = core::mem::take(&mut self.condition).and(condition);
        self
    }

    /// Sets the GROUP BY list.
    #[must_use]
    pub fn group_by(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.group_by = fields.into_iter().collect();
        self
    }

    /// Adds a HAVING condition, joined with AND to any existing one.
    #[must_use]
    pub fn having(mut self, condition: Condition) -> Self {
        self.having = core::mem::take(&mut self.having).and(condition);
        self
    }

    /// Sets the ORDER BY list.
    #[must_use]
    pub fn order_by(mut self, sort: impl IntoIterator<Item = SortField>) -> Self {
        self.order_by = sort.into_iter().collect();
        self
    }

    /// Limits the number of rows.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips rows.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// The WITH clause.
    #[must_use]
    pub const fn with_clause(&self) -> Option<&With> {
        self.with.as_ref()
    }

    /// The select list as written.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The FROM entries.
    #[must_use]
    pub fn tables(&self) -> &[Table] {
        &self.from
    }

    /// The WHERE condition.
    #[must_use]
    pub const fn condition(&self) -> &Condition {
        &self.condition
    }

    /// The GROUP BY list.
    #[must_use]
    pub fn grouping(&self) -> &[Field] {
        &self.group_by
    }

    /// The HAVING condition.
    #[must_use]
    pub const fn having_condition(&self) -> &Condition {
        &self.having
    }

    /// The ORDER BY list.
    #[must_use]
    pub fn ordering(&self) -> &[SortField] {
        &self.order_by
    }

    /// The select list with row values expanded into their members.
    #[must_use]
    pub fn flattened_fields(&self) -> Vec<Field> {
        let mut out = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            field.flatten_into(&mut out);
        }
        out
    }

    /// Returns a select producing the same rows with its flattened columns
    /// named `names`, or `None` when the list is empty or its length differs
    /// from `names`.
    ///
    /// Without GROUP BY, HAVING and ORDER BY the select list is renamed in
    /// place. Otherwise those clauses may refer to the current names, so the
    /// select is kept intact and projected by a wrapper named by `wrapper`:
    /// `SELECT q.a AS v1, ... FROM (select) AS q`.
    #[must_use]
    pub fn with_field_aliases<S: AsRef<str>>(
        &self,
        names: &[S],
        wrapper: impl FnOnce() -> String,
    ) -> Option<Self> {
        let fields = self.flattened_fields();
        if fields.is_empty() || fields.len() != names.len() {
            return None;
        }
        if self.group_by.is_empty() && self.having.is_empty() && self.order_by.is_empty() {
            let fields = fields
                .iter()
                .zip(names)
                .map(|(field, name)| field.unaliased().clone().alias(name.as_ref()))
                .collect();
            return Some(Self {
                fields,
                ..self.clone()
            });
        }

        let output = self.output_names(&fields);
        let inner = Self {
            fields: fields
                .into_iter()
                .zip(&output)
                .map(|(field, name)| {
                    let named = match &field {
                        Field::Aliased { alias, .. } => alias == name,
                        Field::Column(column) => column.name() == name,
                        _ => false,
                    };
                    if named {
                        field
                    } else {
                        field.unaliased().clone().alias(name)
                    }
                })
                .collect(),
            ..self.clone()
        };
        let alias = wrapper();
        let projection = output
            .iter()
            .zip(names)
            .map(|(column, name)| qualified(&alias, column).alias(name.as_ref()));
        Some(Self::new(projection).from(Table::derived(inner, &alias)))
    }

    /// Names under which each of `fields` can be read from a derived table.
    /// Aliases and plain column names are kept. Other expressions get a
    /// generated name that no alias and no column in the query uses.
    fn output_names(&self, fields: &[Field]) -> Vec<String> {
        let mut taken: HashSet<String> = fields
            .iter()
            .filter_map(Field::alias_name)
            .map(str::to_ascii_lowercase)
            .collect();
        let mut collect = |field: Field| {
            if let Field::Column(column) = &field {
                taken.insert(column.name().to_ascii_lowercase());
            }
            field
        };
        for field in fields.iter().chain(&self.group_by) {
            let _ = field.transform(&mut collect);
        }
        for sort in &self.order_by {
            let _ = sort.field().transform(&mut collect);
        }
        let _ = self.having.map_fields(&mut collect);

        let mut output: Vec<String> = Vec::with_capacity(fields.len());
        let mut used = HashSet::new();
        for (i, field) in fields.iter().enumerate() {
            let natural = match field {
                Field::Aliased { alias, .. } => Some(alias.as_str()),
                Field::Column(column) => Some(column.name()),
                _ => None,
            };
            let name = match natural {
                Some(name) if used.insert(name.to_ascii_lowercase()) => name.to_string(),
                _ => {
                    let mut generated = format!("c{}", i + 1);
                    while taken.contains(&generated) || used.contains(&generated) {
                        generated.push('_');
                    }
                    used.insert(generated.clone());
                    generated
                }
            };
            output.push(name);
        }
        output
    }

    fn render_clauses(&self, ctx: &mut RenderContext) -> Result<()> {
        ctx.keyword("SELECT ");
        if self.distinct {
            ctx.keyword("DISTINCT ");
        }

        let mut names = Vec::new();
        for table in &self.from {
            table.declared_names(&mut names);
        }
        for name in names {
            ctx.declare(name, Declaration::Table);
        }

        let fields = self.flattened_fields();
        if fields.is_empty() {
            ctx.sql("*");
        } else {
            let base = ctx.flags();
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    ctx.sql(", ");
                }
                let flags = RenderFlags {
                    declare_fields: matches!(field, Field::Aliased { .. }),
                    ..base
                };
                ctx.with_flags(flags, |ctx| ctx.visit(field))?;
            }
        }

        if !self.from.is_empty() {
            ctx.separator().keyword("FROM ");
            ctx.visit_all(&self.from, ", ")?;
        }
        if !self.condition.is_empty() {
            ctx.separator().keyword("WHERE ");
            ctx.visit(&self.condition)?;
        }
        if !self.group_by.is_empty() {
            ctx.separator().keyword("GROUP BY ");
            ctx.visit_all(&self.group_by, ", ")?;
        }
        if !self.having.is_empty() {
            ctx.separator().keyword("HAVING ");
            ctx.visit(&self.having)?;
        }
        if !self.order_by.is_empty() {
            ctx.separator().keyword("ORDER BY ");
            ctx.visit_all(&self.order_by, ", ")?;
        }
        self.render_limit(ctx);
        Ok(())
    }

    fn render_limit(&self, ctx: &mut RenderContext) {
        match emulation::limit(ctx.dialect()) {
            LimitStrategy::LimitOffset => match (self.limit, self.offset) {
                (Some(limit), offset) => {
                    ctx.separator().keyword("LIMIT ").sql(&limit.to_string());
                    if let Some(offset) = offset {
                        ctx.keyword(" OFFSET ").sql(&offset.to_string());
                    }
                }
                (None, Some(offset)) => {
                    ctx.separator();
                    if let Some(unbounded) = emulation::unbounded_limit(ctx.dialect()) {
                        ctx.keyword("LIMIT ").sql(unbounded).sql(" ");
                    }
                    ctx.keyword("OFFSET ").sql(&offset.to_string());
                }
                (None, None) => {}
            },
            LimitStrategy::OffsetFetch => {
                if let Some(offset) = self.offset {
                    ctx.separator()
                        .keyword("OFFSET ")
                        .sql(&offset.to_string())
                        .keyword(" ROWS");
                }
                if let Some(limit) = self.limit {
                    let position = if self.offset.is_some() { "NEXT " } else { "FIRST " };
                    ctx.separator()
                        .keyword("FETCH ")
                        .keyword(position)
                        .sql(&limit.to_string())
                        .keyword(" ROWS ONLY");
                }
            }
        }
    }

    fn render_scoped(&self, ctx: &mut RenderContext, top_level: bool) -> Result<()> {
        let dialect = ctx.dialect();
        match emulation::with_clause(dialect) {
            WithStrategy::Native => {
                if let Some(with) = &self.with {
                    render_with(ctx, with.recursive, &with.ctes)?;
                    ctx.separator();
                }
                self.render_clauses(ctx)
            }
            WithStrategy::Unsupported => {
                if self.with.is_some() {
                    return Err(RenderError::unsupported("WITH", dialect));
                }
                self.render_clauses(ctx)
            }
            WithStrategy::HoistToTopLevel if top_level && !ctx.flags().ctes_hoisted => {
                self.render_hoisted(ctx, dialect)
            }
            // Already emitted by the outermost select.
            WithStrategy::HoistToTopLevel => self.render_clauses(ctx),
        }
    }

    fn render_hoisted(&self, ctx: &mut RenderContext, dialect: Dialect) -> Result<()> {
        let hoisted = cte::collect_top_level(self, dialect)?;
        if !hoisted.ctes.is_empty() {
            debug!(dialect = %dialect, count = hoisted.ctes.len(), "Hoisting common table expressions");
            render_with(ctx, hoisted.recursive, hoisted.ctes)?;
            ctx.separator();
        }
        let flags = RenderFlags {
            ctes_hoisted: true,
            ..ctx.flags()
        };
        ctx.with_flags(flags, |ctx| self.render_clauses(ctx))
    }
}

impl QueryPart for Select {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        let top_level = !ctx.scope().in_scope();
        ctx.scope_start();
        let result = self.render_scoped(ctx, top_level);
        ctx.scope_end();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qom::{col, count_star, qualified, val};
    use crate::render::{Renderer, Settings};

    fn render(dialect: Dialect, select: &Select) -> String {
        Renderer::new(dialect).render_inlined(select).unwrap()
    }

    #[test]
    fn test_clause_order() {
        let select = Select::new([col("dept"), count_star().alias("n")])
            .distinct()
            .from(Table::named("emp"))
            .where_clause(col("active").eq(val(true)))
            .group_by([col("dept")])
            .having(count_star().gt(val(1)))
            .order_by([SortField::desc(col("n"))]);
        assert_eq!(
            render(Dialect::Postgres16, &select),
            "SELECT DISTINCT dept, COUNT(*) AS n FROM emp WHERE active = TRUE \
             GROUP BY dept HAVING COUNT(*) > 1 ORDER BY n DESC"
        );
    }

    #[test]
    fn test_star_and_no_condition() {
        let select = Select::new([])
            .from(Table::named("t"))
            .where_clause(Condition::NoCondition);
        assert_eq!(render(Dialect::Default, &select), "SELECT * FROM t");
    }

    #[test]
    fn test_where_clauses_accumulate() {
        let select = Select::new([col("a")])
            .from(Table::named("t"))
            .where_clause(col("a").gt(val(1)))
            .where_clause(col("a").lt(val(9)));
        assert_eq!(
            render(Dialect::Default, &select),
            "SELECT a FROM t WHERE a > 1 AND a < 9"
        );
    }

    #[test]
    fn test_limit_offset_per_dialect() {
        let select = Select::new([col("a")]).from(Table::named("t")).limit(10).offset(20);
        assert_eq!(
            render(Dialect::Postgres16, &select),
            "SELECT a FROM t LIMIT 10 OFFSET 20"
        );
        assert_eq!(
            render(Dialect::Derby, &select),
            "SELECT a FROM t OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
        );
        let first = Select::new([col("a")]).from(Table::named("t")).limit(5);
        assert_eq!(
            render(Dialect::Firebird4, &first),
            "SELECT a FROM t FETCH FIRST 5 ROWS ONLY"
        );
    }

    #[test]
    fn test_offset_without_limit() {
        let select = Select::new([col("a")]).from(Table::named("t")).offset(3);
        assert_eq!(render(Dialect::Sqlite, &select), "SELECT a FROM t LIMIT -1 OFFSET 3");
        assert_eq!(
            render(Dialect::MySql8, &select),
            "SELECT a FROM t LIMIT 18446744073709551615 OFFSET 3"
        );
        assert_eq!(render(Dialect::Postgres16, &select), "SELECT a FROM t OFFSET 3");
    }

    #[test]
    fn test_nulls_ordering_emulation() {
        let select = Select::new([col("a")])
            .from(Table::named("t"))
            .order_by([SortField::asc(col("a")).nulls_last()]);
        assert_eq!(
            render(Dialect::Postgres16, &select),
            "SELECT a FROM t ORDER BY a ASC NULLS LAST"
        );
        assert_eq!(
            render(Dialect::MySql8, &select),
            "SELECT a FROM t ORDER BY CASE WHEN a IS NULL THEN 1 ELSE 0 END, a ASC"
        );
    }

    #[test]
    fn test_row_values_flatten_in_select_list() {
        let select = Select::new([Field::row([col("a"), col("b")]), col("c")]).from(Table::named("t"));
        assert_eq!(render(Dialect::Default, &select), "SELECT a, b, c FROM t");
        assert_eq!(select.flattened_fields().len(), 3);
    }

    #[test]
    fn test_with_field_aliases() {
        let select = Select::new([col("a").alias("x"), col("b")]);
        let aliased = select
            .with_field_aliases(&["v1", "v2"], || String::from("q"))
            .unwrap();
        assert_eq!(aliased.fields(), &[col("a").alias("v1"), col("b").alias("v2")]);
        assert_eq!(select.with_field_aliases(&["v1"], || String::from("q")), None);
        let none: &[&str] = &[];
        assert_eq!(Select::new([]).with_field_aliases(none, || String::from("q")), None);
    }

    #[test]
    fn test_with_field_aliases_keeps_ordered_select_intact() {
        let select = Select::new([col("a").alias("x"), col("b"), col("a") * inline(2)])
            .from(Table::named("t"))
            .order_by([SortField::desc(col("x"))])
            .limit(1);
        let wrapped = select
            .with_field_aliases(&["v1", "v2", "v3"], || String::from("q"))
            .unwrap();
        assert_eq!(
            render(Dialect::Postgres16, &wrapped),
            "SELECT q.x AS v1, q.b AS v2, q.c3 AS v3 \
             FROM (SELECT a AS x, b, a * 2 AS c3 FROM t ORDER BY x DESC LIMIT 1) AS q"
        );
    }

    #[test]
    fn test_with_field_aliases_generated_names_avoid_grouped_columns() {
        let select = Select::new([col("c2"), count_star()])
            .from(Table::named("t"))
            .group_by([col("c2")])
            .having(count_star().gt(inline(1)));
        let wrapped = select
            .with_field_aliases(&["k", "n"], || String::from("q"))
            .unwrap();
        assert_eq!(
            render(Dialect::Postgres16, &wrapped),
            "SELECT q.c2 AS k, q.c2_ AS n \
             FROM (SELECT c2, COUNT(*) AS c2_ FROM t GROUP BY c2 HAVING COUNT(*) > 1) AS q"
        );
    }

    #[test]
    fn test_native_with_clause() {
        let cte = CommonTableExpression::new("recent", Select::new([col("id")]).from(Table::named("orders")))
            .with_columns(&["order_id"]);
        let select = Select::new([col("order_id")])
            .with(With::new([cte]))
            .from(Table::named("recent"));
        assert_eq!(
            render(Dialect::Postgres16, &select),
            "WITH recent(order_id) AS (SELECT id FROM orders) SELECT order_id FROM recent"
        );
        assert_eq!(
            Renderer::new(Dialect::MySql57).render(&select),
            Err(RenderError::unsupported("WITH", Dialect::MySql57))
        );
    }

    #[test]
    fn test_duplicate_cte_is_rejected() {
        let body = Select::new([col("a")]).from(Table::named("t"));
        let select = Select::new([])
            .with(With::new([
                CommonTableExpression::new("c", body.clone()),
                CommonTableExpression::new("c", body),
            ]))
            .from(Table::named("c"));
        for dialect in [Dialect::Postgres16, Dialect::Firebird4] {
            assert_eq!(
                Renderer::new(dialect).render(&select),
                Err(RenderError::DuplicateCte(String::from("c")))
            );
        }
    }

    #[test]
    fn test_formatted_output() {
        let select = Select::new([col("a")])
            .from(Table::derived(Select::new([col("a")]).from(Table::named("t")), "d"))
            .where_clause(qualified("d", "a").is_not_null());
        let settings = Settings::default().with_formatting(true);
        let sql = Renderer::with_settings(Dialect::Default, settings)
            .render(&select)
            .unwrap()
            .sql;
        assert_eq!(
            sql,
            "SELECT a\nFROM (\n  SELECT a\n  FROM t\n) AS d\nWHERE d.a IS NOT NULL"
        );
    }
}
