//! Collection of common table expressions for dialects that only accept a
//! WITH clause on the outermost statement.
//!
//! The collector walks a select and every nested query reachable from it,
//! tracking CTE declarations per query level in a [`ScopeStack`]. A CTE is
//! emitted after every CTE nested in its own body, and CTEs nested in a
//! query body follow the WITH clause of that query, so each CTE is declared
//! before anything that can see it. Structurally equal repeats are collapsed.

use indexmap::IndexMap;

use crate::dialect::Dialect;
use crate::error::{RenderError, Result};
use crate::qom::{
    Case, CommonTableExpression, Condition, Field, JoinCondition, JsonOnEmpty, Select, SortField,
    Table, WindowSpec,
};
use crate::scope::ScopeStack;

/// The WITH clause to emit on the outermost select.
#[derive(Debug)]
pub(crate) struct TopLevelCtes<'a> {
    /// Whether any collected WITH clause was recursive.
    pub recursive: bool,
    /// Common table expressions in emission order.
    pub ctes: Vec<&'a CommonTableExpression>,
}

/// Collects every common table expression declared in `select` or in any
/// query nested inside it.
///
/// # Errors
///
/// Returns [`RenderError::DuplicateCte`] when a WITH clause declares a name
/// twice, and [`RenderError::CteShadowing`] when a nested CTE reuses a
/// visible name with a different definition.
pub(crate) fn collect_top_level(select: &Select, dialect: Dialect) -> Result<TopLevelCtes<'_>> {
    let mut collector = Collector {
        dialect,
        scope: ScopeStack::new(),
        hoisted: IndexMap::new(),
        recursive: false,
    };
    collector.select(select)?;
    Ok(TopLevelCtes {
        recursive: collector.recursive,
        ctes: collector.hoisted.into_values().collect(),
    })
}

struct Collector<'a> {
    dialect: Dialect,
    scope: ScopeStack<&'a str, &'a CommonTableExpression>,
    hoisted: IndexMap<&'a str, &'a CommonTableExpression>,
    recursive: bool,
}

impl<'a> Collector<'a> {
    fn select(&mut self, select: &'a Select) -> Result<()> {
        self.scope.scope_start();
        let result = self.select_scoped(select);
        self.scope.scope_end();
        result
    }

    fn select_scoped(&mut self, select: &'a Select) -> Result<()> {
        if let Some(with) = select.with_clause() {
            self.recursive |= with.is_recursive();
            for cte in with.ctes() {
                self.declare(cte)?;
            }
        }
        for field in select.fields() {
            self.field(field)?;
        }
        for table in select.tables() {
            self.table(table)?;
        }
        self.condition(select.condition())?;
        for field in select.grouping() {
            self.field(field)?;
        }
        self.condition(select.having_condition())?;
        self.sort_fields(select.ordering())
    }

    fn declare(&mut self, cte: &'a CommonTableExpression) -> Result<()> {
        let name = cte.name();
        if self.scope.get_current_scope(name).is_some() {
            return Err(RenderError::DuplicateCte(String::from(name)));
        }
        if let Some(outer) = self.scope.get(name) {
            if *outer != cte {
                return Err(self.shadowing(name));
            }
        }
        self.scope.set(name, cte);
        self.select(cte.select())?;
        self.hoist(cte)
    }

    fn hoist(&mut self, cte: &'a CommonTableExpression) -> Result<()> {
        match self.hoisted.get(cte.name()) {
            Some(existing) if *existing == cte => Ok(()),
            Some(_) => Err(self.shadowing(cte.name())),
            None => {
                self.hoisted.insert(cte.name(), cte);
                Ok(())
            }
        }
    }

    fn shadowing(&self, name: &str) -> RenderError {
        RenderError::CteShadowing {
            name: String::from(name),
            dialect: self.dialect,
        }
    }

    fn fields(&mut self, fields: &'a [Field]) -> Result<()> {
        fields.iter().try_for_each(|field| self.field(field))
    }

    fn field(&mut self, field: &'a Field) -> Result<()> {
        match field {
            Field::Column(_) | Field::Value(_) | Field::Inline(_) => Ok(()),
            Field::Subquery(select) => self.select(select),
            Field::Condition(condition) => self.condition(condition),
            Field::Arithmetic { left, right, .. } => {
                self.field(left)?;
                self.field(right)
            }
            Field::Neg(inner) | Field::BitNot(inner) | Field::Cast { field: inner, .. } => {
                self.field(inner)
            }
            Field::Aliased { field: inner, .. } => self.field(inner),
            Field::Greatest(g) => self.fields(g.args()),
            Field::Least(l) => self.fields(l.args()),
            Field::Coalesce(c) => self.fields(c.args()),
            Field::Function(call) => self.fields(call.args()),
            Field::Aggregate(aggregate) => {
                if let Some(value) = aggregate.value() {
                    self.field(value)?;
                }
                match aggregate.window() {
                    Some(window) => self.window(window),
                    None => Ok(()),
                }
            }
            Field::Case(case) => self.case(case),
            Field::JsonObject(object) => object
                .entries()
                .iter()
                .try_for_each(|entry| self.field(entry.value())),
            Field::JsonArray(array) => self.fields(array.elements()),
            Field::JsonValue(value) => {
                self.field(value.document())?;
                match value.on_empty() {
                    Some(JsonOnEmpty::Default(default)) => self.field(default),
                    _ => Ok(()),
                }
            }
            Field::Row(fields) => self.fields(fields),
            Field::Raw(raw) => self.fields(raw.substitutes()),
        }
    }

    fn window(&mut self, window: &'a WindowSpec) -> Result<()> {
        self.fields(window.partitions())?;
        self.sort_fields(window.ordering())
    }

    fn sort_fields(&mut self, sort: &'a [SortField]) -> Result<()> {
        sort.iter().try_for_each(|s| self.field(s.field()))
    }

    fn case(&mut self, case: &'a Case) -> Result<()> {
        match case {
            Case::Searched {
                branches,
                otherwise,
            } => {
                for (condition, result) in branches {
                    self.condition(condition)?;
                    self.field(result)?;
                }
                if let Some(otherwise) = otherwise {
                    self.field(otherwise)?;
                }
            }
            Case::Simple {
                value,
                branches,
                otherwise,
            } => {
                self.field(value)?;
                for (candidate, result) in branches {
                    self.field(candidate)?;
                    self.field(result)?;
                }
                if let Some(otherwise) = otherwise {
                    self.field(otherwise)?;
                }
            }
        }
        Ok(())
    }

    fn condition(&mut self, condition: &'a Condition) -> Result<()> {
        match condition {
            Condition::NoCondition => Ok(()),
            Condition::Compare { left, right, .. } => {
                self.field(left)?;
                self.field(right)
            }
            Condition::IsNull { field, .. } | Condition::Field(field) => self.field(field),
            Condition::Between {
                field, low, high, ..
            } => {
                self.field(field)?;
                self.field(low)?;
                self.field(high)
            }
            Condition::In { field, list, .. } => {
                self.field(field)?;
                self.fields(list)
            }
            Condition::Exists { select, .. } | Condition::SelectIsNull { select, .. } => {
                self.select(select)
            }
            Condition::Combined { conditions, .. } => {
                conditions.iter().try_for_each(|c| self.condition(c))
            }
            Condition::Xor(left, right) => {
                self.condition(left)?;
                self.condition(right)
            }
            Condition::Not(inner) => self.condition(inner),
            Condition::XmlExists(xml) => self.field(xml.document()),
            Condition::Raw(raw) => self.fields(raw.substitutes()),
        }
    }

    fn table(&mut self, table: &'a Table) -> Result<()> {
        match table {
            Table::Named { .. } => Ok(()),
            Table::Derived { select, .. } => self.select(select),
            Table::Lateral(inner) | Table::Hinted { table: inner, .. } => self.table(inner),
            Table::Join {
                left,
                right,
                condition,
                ..
            } => {
                self.table(left)?;
                self.table(right)?;
                match condition {
                    JoinCondition::On(on) => self.condition(on),
                    JoinCondition::None | JoinCondition::Using(_) => Ok(()),
                }
            }
        }
    }
}
