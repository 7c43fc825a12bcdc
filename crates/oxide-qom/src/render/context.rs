//! The mutable state threaded through one render pass.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::dialect::{Dialect, Family, PlaceholderStyle};
use crate::error::Result;
use crate::scope::ScopeStack;
use crate::value::SqlValue;

use super::settings::{ParamType, RenderQuotedNames, Settings};
use super::{QueryPart, Rendered};

const RESERVED_WORDS: &[&str] = &[
    "ALL", "AND", "AS", "ASC", "BETWEEN", "BY", "CASE", "CAST", "CHECK", "COLUMN", "CONSTRAINT",
    "CREATE", "CROSS", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP", "ELSE", "END", "EXISTS",
    "FALSE", "FETCH", "FOR", "FOREIGN", "FROM", "FULL", "GROUP", "HAVING", "IN", "INDEX", "INNER",
    "INSERT", "INTO", "IS", "JOIN", "KEY", "LATERAL", "LEFT", "LIKE", "LIMIT", "NATURAL", "NOT",
    "NULL", "OFFSET", "ON", "OR", "ORDER", "OUTER", "OVER", "PARTITION", "PRIMARY", "REFERENCES",
    "RIGHT", "ROW", "ROWS", "SELECT", "SET", "TABLE", "THEN", "TRUE", "UNION", "UNIQUE", "UPDATE",
    "USER", "USING", "VALUE", "VALUES", "WHEN", "WHERE", "WINDOW", "WITH",
];

/// Typed flags that change how nested parts render.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderFlags {
    /// Aliased fields render as `expr AS alias` rather than as a reference
    /// to the alias. Set for each entry of a select list.
    pub declare_fields: bool,
    /// Common table expressions have been moved to the outermost WITH
    /// clause, so nested selects must not render their own.
    pub ctes_hoisted: bool,
}

/// Key into the render-local data map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataKey(&'static str);

impl DataKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the key name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

/// Value stored in the render-local data map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataValue {
    /// A boolean flag.
    Flag(bool),
    /// An integer.
    Int(i64),
    /// A string.
    Text(String),
}

/// What a name declared in the current scope refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declaration {
    /// A table or table alias in a FROM clause.
    Table,
    /// A common table expression.
    Cte,
    /// An alias generated by the renderer.
    Alias,
}

/// What a detached context copies from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inherit {
    /// Start with an empty data map.
    Nothing,
    /// Start with a copy of the parent's data map.
    Data,
}

/// State for a single render pass.
///
/// A context is created per render call and discarded afterwards; it is never
/// shared between passes. Parts write SQL text into it, register bind values
/// in output order and open a scope for each nested query level.
#[derive(Debug)]
pub struct RenderContext {
    dialect: Dialect,
    settings: Settings,
    sql: String,
    binds: Vec<SqlValue>,
    // Byte offsets of `$n` placeholders, numbered in `finish`.
    placeholders: Vec<usize>,
    indent: usize,
    flags: RenderFlags,
    data: HashMap<DataKey, DataValue>,
    scope: ScopeStack<String, Declaration>,
}

impl RenderContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new(dialect: Dialect, settings: Settings) -> Self {
        Self {
            dialect,
            settings,
            sql: String::new(),
            binds: Vec::new(),
            placeholders: Vec::new(),
            indent: 0,
            flags: RenderFlags::default(),
            data: HashMap::new(),
            scope: ScopeStack::new(),
        }
    }

    /// Returns the target dialect.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Returns the target dialect's family.
    #[must_use]
    pub const fn family(&self) -> Family {
        self.dialect.family()
    }

    /// Returns the render settings.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Appends raw SQL text.
    pub fn sql(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    /// Appends a keyword.
    pub fn keyword(&mut self, keyword: &str) -> &mut Self {
        self.sql(keyword)
    }

    /// Renders a query part into this context.
    ///
    /// # Errors
    ///
    /// Propagates the part's render error.
    pub fn visit<P: QueryPart + ?Sized>(&mut self, part: &P) -> Result<()> {
        part.accept(self)
    }

    /// Renders parts separated by `separator`.
    ///
    /// # Errors
    ///
    /// Propagates the first render error.
    pub fn visit_all<P: QueryPart>(&mut self, parts: &[P], separator: &str) -> Result<()> {
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                self.sql(separator);
            }
            part.accept(self)?;
        }
        Ok(())
    }

    /// Renders a part in parentheses, indented when formatting.
    ///
    /// # Errors
    ///
    /// Propagates the part's render error.
    pub fn visit_subquery<P: QueryPart + ?Sized>(&mut self, part: &P) -> Result<()> {
        self.sql("(");
        self.indent_start();
        part.accept(self)?;
        self.indent_end();
        self.sql(")");
        Ok(())
    }

    /// Appends an identifier, quoted according to the settings.
    pub fn visit_name(&mut self, name: &str) -> &mut Self {
        let quote = match self.settings.render_quoted_names {
            RenderQuotedNames::Always => true,
            RenderQuotedNames::Never => false,
            RenderQuotedNames::AsNeeded => needs_quoting(name),
        };
        if quote {
            let quoted = self.dialect.quote_identifier(name);
            self.sql.push_str(&quoted);
        } else {
            self.sql.push_str(name);
        }
        self
    }

    /// Appends a bind value, as a placeholder or inlined depending on
    /// [`Settings::param_type`].
    pub fn bind_value(&mut self, value: &SqlValue) -> &mut Self {
        if self.settings.param_type == ParamType::Inlined {
            return self.inline_value(value);
        }
        match self.dialect.placeholder_style() {
            PlaceholderStyle::Question => self.sql.push('?'),
            PlaceholderStyle::Dollar => self.placeholders.push(self.sql.len()),
        }
        self.binds.push(value.clone());
        self
    }

    /// Appends a value as an escaped literal.
    pub fn inline_value(&mut self, value: &SqlValue) -> &mut Self {
        let literal = value.to_sql_inline(self.dialect);
        self.sql(&literal)
    }

    /// Returns the number of binds collected so far.
    #[must_use]
    pub fn bind_count(&self) -> usize {
        self.binds.len()
    }

    /// Separates two clauses: a newline when formatting, a space otherwise.
    pub fn separator(&mut self) -> &mut Self {
        if self.settings.render_formatted {
            self.newline();
        } else {
            self.sql.push(' ');
        }
        self
    }

    /// Increases the indentation level.
    pub fn indent_start(&mut self) -> &mut Self {
        self.indent += 1;
        if self.settings.render_formatted {
            self.newline();
        }
        self
    }

    /// Decreases the indentation level.
    pub fn indent_end(&mut self) -> &mut Self {
        self.indent = self.indent.saturating_sub(1);
        if self.settings.render_formatted {
            self.newline();
        }
        self
    }

    fn newline(&mut self) {
        self.sql.push('\n');
        for _ in 0..self.indent {
            self.sql.push_str(&self.settings.indentation);
        }
    }

    /// Returns the current flags.
    #[must_use]
    pub const fn flags(&self) -> RenderFlags {
        self.flags
    }

    /// Runs `f` with `flags` in effect, restoring the previous flags after.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `f`.
    pub fn with_flags<T>(
        &mut self,
        flags: RenderFlags,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let previous = core::mem::replace(&mut self.flags, flags);
        let result = f(self);
        self.flags = previous;
        result
    }

    /// Returns a value from the data map.
    #[must_use]
    pub fn data(&self, key: DataKey) -> Option<&DataValue> {
        self.data.get(&key)
    }

    /// Stores a value in the data map, returning the previous one.
    pub fn set_data(&mut self, key: DataKey, value: DataValue) -> Option<DataValue> {
        self.data.insert(key, value)
    }

    /// Removes a value from the data map.
    pub fn remove_data(&mut self, key: DataKey) -> Option<DataValue> {
        self.data.remove(&key)
    }

    /// Returns the declaration scopes.
    #[must_use]
    pub const fn scope(&self) -> &ScopeStack<String, Declaration> {
        &self.scope
    }

    /// Opens a scope for a nested query level.
    pub fn scope_start(&mut self) {
        self.scope.scope_start();
    }

    /// Closes the current query level's scope.
    pub fn scope_end(&mut self) {
        self.scope.scope_end();
    }

    /// Declares `name` in the current scope. Ignored when no scope is open.
    pub fn declare(&mut self, name: impl Into<String>, declaration: Declaration) {
        if self.scope.in_scope() {
            self.scope.set(name.into(), declaration);
        }
    }

    /// Returns an alias starting with `prefix` that is not visible in any
    /// open scope, and declares it in the current one.
    pub fn fresh_alias(&mut self, prefix: &str) -> String {
        if !self.scope.in_scope() {
            return prefix.to_string();
        }
        let mut candidate = prefix.to_string();
        let mut n = 0;
        while self.scope.get(candidate.as_str()).is_some() {
            n += 1;
            candidate = format!("{prefix}{n}");
        }
        self.scope.set(candidate.clone(), Declaration::Alias);
        candidate
    }

    /// Creates an isolated child context with the same dialect, settings,
    /// flags and indentation, but its own output and binds. Names visible
    /// here stay visible in the child, so its generated aliases avoid them.
    ///
    /// The child's output can be merged back with [`absorb`](Self::absorb),
    /// any number of times, or dropped.
    #[must_use]
    pub fn detached(&self, inherit: Inherit) -> Self {
        Self {
            dialect: self.dialect,
            settings: self.settings.clone(),
            sql: String::new(),
            binds: Vec::new(),
            placeholders: Vec::new(),
            indent: self.indent,
            flags: self.flags,
            data: match inherit {
                Inherit::Nothing => HashMap::new(),
                Inherit::Data => self.data.clone(),
            },
            scope: self.visible_scope(),
        }
    }

    /// One scope level holding every declaration visible here.
    fn visible_scope(&self) -> ScopeStack<String, Declaration> {
        let mut scope = ScopeStack::new();
        if self.scope.in_scope() {
            scope.scope_start();
            for (name, declaration) in self.scope.iter() {
                scope.set(name.clone(), *declaration);
            }
        }
        scope
    }

    /// Appends a detached child's output and binds.
    pub fn absorb(&mut self, child: &Self) {
        let base = self.sql.len();
        self.placeholders
            .extend(child.placeholders.iter().map(|offset| offset + base));
        self.sql.push_str(&child.sql);
        self.binds.extend(child.binds.iter().cloned());
    }

    /// Ends the pass, numbering positional placeholders.
    #[must_use]
    pub fn finish(self) -> Rendered {
        if self.placeholders.is_empty() {
            return Rendered {
                sql: self.sql,
                binds: self.binds,
            };
        }
        let mut sql = String::with_capacity(self.sql.len() + self.placeholders.len() * 3);
        let mut last = 0;
        for (i, offset) in self.placeholders.iter().enumerate() {
            sql.push_str(&self.sql[last..*offset]);
            let _ = write!(sql, "${}", i + 1);
            last = *offset;
        }
        sql.push_str(&self.sql[last..]);
        Rendered {
            sql,
            binds: self.binds,
        }
    }
}

fn needs_quoting(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return true;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return true;
    }
    RESERVED_WORDS
        .iter()
        .any(|word| word.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(dialect: Dialect) -> RenderContext {
        RenderContext::new(dialect, Settings::default())
    }

    #[test]
    fn test_question_placeholders() {
        let mut ctx = context(Dialect::Sqlite);
        ctx.sql("a = ").bind_value(&SqlValue::Int(1));
        ctx.sql(" AND b = ").bind_value(&SqlValue::Int(2));
        let rendered = ctx.finish();
        assert_eq!(rendered.sql, "a = ? AND b = ?");
        assert_eq!(rendered.binds, vec![SqlValue::Int(1), SqlValue::Int(2)]);
    }

    #[test]
    fn test_dollar_placeholders_follow_output_order() {
        let mut ctx = context(Dialect::Postgres16);
        ctx.sql("a = ").bind_value(&SqlValue::Int(1));
        let mut child = ctx.detached(Inherit::Nothing);
        child.sql("b = ").bind_value(&SqlValue::Int(2));
        ctx.sql(" AND ");
        ctx.absorb(&child);
        ctx.sql(" AND ");
        ctx.absorb(&child);
        let rendered = ctx.finish();
        assert_eq!(rendered.sql, "a = $1 AND b = $2 AND b = $3");
        assert_eq!(rendered.binds.len(), 3);
    }

    #[test]
    fn test_inlined_values() {
        let settings = Settings::default().with_param_type(ParamType::Inlined);
        let mut ctx = RenderContext::new(Dialect::Postgres16, settings);
        ctx.sql("a = ").bind_value(&SqlValue::Text(String::from("it's")));
        let rendered = ctx.finish();
        assert_eq!(rendered.sql, "a = 'it''s'");
        assert!(rendered.binds.is_empty());
    }

    #[test]
    fn test_name_quoting() {
        let mut ctx = context(Dialect::MySql8);
        ctx.visit_name("plain").sql(" ").visit_name("order").sql(" ").visit_name("two words");
        assert_eq!(ctx.finish().sql, "plain `order` `two words`");

        let always = Settings::default().with_quoted_names(RenderQuotedNames::Always);
        let mut ctx = RenderContext::new(Dialect::Postgres16, always);
        ctx.visit_name("plain");
        assert_eq!(ctx.finish().sql, "\"plain\"");
    }

    #[test]
    fn test_fresh_alias_avoids_visible_names() {
        let mut ctx = context(Dialect::Default);
        ctx.scope_start();
        ctx.declare("t", Declaration::Table);
        ctx.scope_start();
        assert_eq!(ctx.fresh_alias("t"), "t1");
        assert_eq!(ctx.fresh_alias("t"), "t2");
        ctx.scope_end();
        assert_eq!(ctx.fresh_alias("t"), "t1");
        ctx.scope_end();
    }

    #[test]
    fn test_detached_context_sees_visible_names() {
        let mut ctx = context(Dialect::Default);
        assert_eq!(ctx.detached(Inherit::Nothing).fresh_alias("t"), "t");

        ctx.scope_start();
        ctx.declare("t", Declaration::Table);
        let mut child = ctx.detached(Inherit::Nothing);
        assert_eq!(child.scope().get("t"), Some(&Declaration::Table));
        assert_eq!(child.fresh_alias("t"), "t1");
        assert_eq!(ctx.scope().get("t1"), None);
        ctx.scope_end();
    }

    #[test]
    fn test_detached_data_inheritance() {
        const KEY: DataKey = DataKey::new("marker");
        let mut ctx = context(Dialect::Default);
        ctx.set_data(KEY, DataValue::Flag(true));
        assert_eq!(ctx.detached(Inherit::Data).data(KEY), Some(&DataValue::Flag(true)));
        assert_eq!(ctx.detached(Inherit::Nothing).data(KEY), None);
    }

    #[test]
    fn test_with_flags_restores_on_error() {
        let mut ctx = context(Dialect::Default);
        let flags = RenderFlags {
            declare_fields: true,
            ..RenderFlags::default()
        };
        let result: Result<()> = ctx.with_flags(flags, |ctx| {
            assert!(ctx.flags().declare_fields);
            Err(crate::error::RenderError::DuplicateCte(String::from("x")))
        });
        assert!(result.is_err());
        assert!(!ctx.flags().declare_fields);
    }

    #[test]
    fn test_formatted_separators() {
        let settings = Settings::default().with_formatting(true);
        let mut ctx = RenderContext::new(Dialect::Default, settings);
        ctx.sql("SELECT a").separator().sql("FROM (");
        ctx.indent_start().sql("SELECT 1");
        ctx.indent_end().sql(")");
        assert_eq!(ctx.finish().sql, "SELECT a\nFROM (\n  SELECT 1\n)");
    }
}
