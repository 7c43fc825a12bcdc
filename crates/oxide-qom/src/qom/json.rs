//! SQL/JSON constructors and `JSON_VALUE`.

use tracing::debug;

use super::field::Field;
use super::types::DataType;
use crate::emulation::{self, JsonConstructorStrategy, JsonValueStrategy};
use crate::error::{RenderError, Result};
use crate::render::{QueryPart, RenderContext};
use crate::value::SqlValue;

/// Behaviour of a JSON constructor for NULL members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonOnNull {
    /// `NULL ON NULL`: keep NULL members.
    Null,
    /// `ABSENT ON NULL`: drop NULL members.
    Absent,
}

impl JsonOnNull {
    const fn clause(self) -> &'static str {
        match self {
            Self::Null => "NULL ON NULL",
            Self::Absent => "ABSENT ON NULL",
        }
    }
}

/// Behaviour of `JSON_VALUE` when the path matches nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonOnEmpty {
    /// `NULL ON EMPTY`.
    Null,
    /// `ERROR ON EMPTY`.
    Error,
    /// `DEFAULT value ON EMPTY`.
    Default(Box<Field>),
}

/// A key/value member of a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonEntry {
    key: String,
    value: Field,
}

impl JsonEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(key: &str, value: Field) -> Self {
        Self {
            key: String::from(key),
            value,
        }
    }

    /// The key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The value.
    #[must_use]
    pub const fn value(&self) -> &Field {
        &self.value
    }
}

fn render_key(ctx: &mut RenderContext, key: &str) {
    ctx.inline_value(&SqlValue::Text(String::from(key)));
}

fn render_on_null(ctx: &mut RenderContext, on_null: Option<JsonOnNull>, has_members: bool) {
    let Some(on_null) = on_null else {
        return;
    };
    if !emulation::json_on_null(ctx.dialect()) {
        debug!(dialect = %ctx.dialect(), clause = on_null.clause(), "Omitting unsupported JSON ON NULL clause");
        return;
    }
    if has_members {
        ctx.sql(" ");
    }
    ctx.keyword(on_null.clause());
}

/// `JSON_OBJECT(KEY k VALUE v, ...)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonObject {
    entries: Vec<JsonEntry>,
    on_null: Option<JsonOnNull>,
}

impl JsonObject {
    /// Creates an object from its entries.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = JsonEntry>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
            on_null: None,
        }
    }

    /// Sets the NULL member behaviour.
    #[must_use]
    pub const fn on_null(mut self, on_null: JsonOnNull) -> Self {
        self.on_null = Some(on_null);
        self
    }

    /// The entries.
    #[must_use]
    pub fn entries(&self) -> &[JsonEntry] {
        &self.entries
    }

    pub(crate) fn map_fields<F: FnMut(Field) -> Field>(&self, f: &mut F) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|entry| JsonEntry {
                    key: entry.key.clone(),
                    value: entry.value.transform(f),
                })
                .collect(),
            on_null: self.on_null,
        }
    }

    fn render_pairs(&self, ctx: &mut RenderContext) -> Result<()> {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                ctx.sql(", ");
            }
            render_key(ctx, &entry.key);
            ctx.sql(", ");
            ctx.visit(&entry.value)?;
        }
        Ok(())
    }
}

impl From<JsonObject> for Field {
    fn from(object: JsonObject) -> Self {
        Self::JsonObject(object)
    }
}

impl QueryPart for JsonObject {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        match emulation::json_constructor(ctx.dialect()) {
            JsonConstructorStrategy::Standard => {
                ctx.keyword("JSON_OBJECT(");
                for (i, entry) in self.entries.iter().enumerate() {
                    if i > 0 {
                        ctx.sql(", ");
                    }
                    ctx.keyword("KEY ");
                    render_key(ctx, &entry.key);
                    ctx.keyword(" VALUE ");
                    ctx.visit(&entry.value)?;
                }
                render_on_null(ctx, self.on_null, !self.entries.is_empty());
                ctx.sql(")");
                Ok(())
            }
            JsonConstructorStrategy::CommaSeparated => {
                if let Some(on_null) = self.on_null {
                    debug!(dialect = %ctx.dialect(), clause = on_null.clause(), "Omitting unsupported JSON ON NULL clause");
                }
                ctx.keyword("JSON_OBJECT(");
                self.render_pairs(ctx)?;
                ctx.sql(")");
                Ok(())
            }
            JsonConstructorStrategy::BuildFunction => {
                let strip = self.on_null == Some(JsonOnNull::Absent);
                if strip {
                    ctx.sql("json_strip_nulls(");
                }
                ctx.sql("json_build_object(");
                self.render_pairs(ctx)?;
                ctx.sql(")");
                if strip {
                    ctx.sql(")");
                }
                Ok(())
            }
            JsonConstructorStrategy::Unsupported => {
                Err(RenderError::unsupported("JSON_OBJECT", ctx.dialect()))
            }
        }
    }
}

/// `JSON_ARRAY(v, ...)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonArray {
    elements: Vec<Field>,
    on_null: Option<JsonOnNull>,
}

impl JsonArray {
    /// Creates an array from its elements.
    #[must_use]
    pub fn new(elements: impl IntoIterator<Item = Field>) -> Self {
        Self {
            elements: elements.into_iter().collect(),
            on_null: None,
        }
    }

    /// Sets the NULL element behaviour.
    #[must_use]
    pub const fn on_null(mut self, on_null: JsonOnNull) -> Self {
        self.on_null = Some(on_null);
        self
    }

    /// The elements.
    #[must_use]
    pub fn elements(&self) -> &[Field] {
        &self.elements
    }

    /// Rebuilds the array over new elements.
    #[must_use]
    pub fn with_elements(&self, elements: impl IntoIterator<Item = Field>) -> Self {
        Self {
            elements: elements.into_iter().collect(),
            on_null: self.on_null,
        }
    }
}

impl From<JsonArray> for Field {
    fn from(array: JsonArray) -> Self {
        Self::JsonArray(array)
    }
}

impl QueryPart for JsonArray {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        let dialect = ctx.dialect();
        match emulation::json_constructor(dialect) {
            JsonConstructorStrategy::Standard => {
                ctx.keyword("JSON_ARRAY(");
                ctx.visit_all(&self.elements, ", ")?;
                render_on_null(ctx, self.on_null, !self.elements.is_empty());
                ctx.sql(")");
                Ok(())
            }
            JsonConstructorStrategy::CommaSeparated => {
                if let Some(on_null) = self.on_null {
                    debug!(dialect = %dialect, clause = on_null.clause(), "Omitting unsupported JSON ON NULL clause");
                }
                ctx.keyword("JSON_ARRAY(");
                ctx.visit_all(&self.elements, ", ")?;
                ctx.sql(")");
                Ok(())
            }
            JsonConstructorStrategy::BuildFunction => {
                if self.on_null == Some(JsonOnNull::Absent) {
                    return Err(RenderError::unsupported("JSON_ARRAY ABSENT ON NULL", dialect));
                }
                ctx.sql("json_build_array(");
                ctx.visit_all(&self.elements, ", ")?;
                ctx.sql(")");
                Ok(())
            }
            JsonConstructorStrategy::Unsupported => {
                Err(RenderError::unsupported("JSON_ARRAY", dialect))
            }
        }
    }
}

/// `JSON_VALUE(document, path [RETURNING type] [... ON EMPTY])`.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonValue {
    document: Box<Field>,
    path: String,
    returning: Option<DataType>,
    on_empty: Option<JsonOnEmpty>,
}

impl JsonValue {
    /// Extracts the scalar at `path` from `document`.
    #[must_use]
    pub fn new(document: Field, path: &str) -> Self {
        Self {
            document: Box::new(document),
            path: String::from(path),
            returning: None,
            on_empty: None,
        }
    }

    /// Converts the extracted value to `data_type`.
    #[must_use]
    pub fn with_returning(mut self, data_type: DataType) -> Self {
        self.returning = Some(data_type);
        self
    }

    /// Sets the behaviour when the path matches nothing.
    #[must_use]
    pub fn with_on_empty(mut self, on_empty: JsonOnEmpty) -> Self {
        self.on_empty = Some(on_empty);
        self
    }

    /// The JSON document.
    #[must_use]
    pub fn document(&self) -> &Field {
        &self.document
    }

    /// The JSON path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The requested result type.
    #[must_use]
    pub const fn returning(&self) -> Option<&DataType> {
        self.returning.as_ref()
    }

    /// The behaviour when the path matches nothing.
    #[must_use]
    pub const fn on_empty(&self) -> Option<&JsonOnEmpty> {
        self.on_empty.as_ref()
    }

    pub(crate) fn map_fields<F: FnMut(Field) -> Field>(&self, f: &mut F) -> Self {
        Self {
            document: Box::new(self.document.transform(f)),
            path: self.path.clone(),
            returning: self.returning.clone(),
            on_empty: match &self.on_empty {
                Some(JsonOnEmpty::Default(field)) => {
                    Some(JsonOnEmpty::Default(Box::new(field.transform(f))))
                }
                other => other.clone(),
            },
        }
    }

    fn render_standard(&self, ctx: &mut RenderContext) -> Result<()> {
        ctx.keyword("JSON_VALUE(");
        ctx.visit(self.document.as_ref())?;
        ctx.sql(", ");
        ctx.inline_value(&SqlValue::Text(self.path.clone()));
        if let Some(data_type) = &self.returning {
            let target = data_type.cast_target(ctx.dialect());
            ctx.keyword(" RETURNING ").sql(&target);
        }
        if let Some(on_empty) = &self.on_empty {
            if emulation::json_on_empty(ctx.dialect()) {
                match on_empty {
                    JsonOnEmpty::Null => {
                        ctx.keyword(" NULL ON EMPTY");
                    }
                    JsonOnEmpty::Error => {
                        ctx.keyword(" ERROR ON EMPTY");
                    }
                    JsonOnEmpty::Default(field) => {
                        ctx.keyword(" DEFAULT ");
                        ctx.visit(field.as_ref())?;
                        ctx.keyword(" ON EMPTY");
                    }
                }
            } else {
                debug!(dialect = %ctx.dialect(), "Omitting unsupported JSON ON EMPTY clause");
            }
        }
        ctx.sql(")");
        Ok(())
    }

    /// Renders a function substitute. `RETURNING` becomes a cast and
    /// `DEFAULT ... ON EMPTY` a `COALESCE`.
    fn render_substitute(&self, ctx: &mut RenderContext, function: &str) -> Result<()> {
        let dialect = ctx.dialect();
        let default = match &self.on_empty {
            Some(JsonOnEmpty::Error) => {
                return Err(RenderError::unsupported("JSON_VALUE ERROR ON EMPTY", dialect));
            }
            Some(JsonOnEmpty::Default(field)) => Some(field.as_ref()),
            Some(JsonOnEmpty::Null) | None => None,
        };
        debug!(dialect = %dialect, substitute = function, "Using substitute for JSON_VALUE");

        if default.is_some() {
            ctx.sql("COALESCE(");
        }
        if self.returning.is_some() {
            ctx.keyword("CAST(");
        }
        if function == "jsonb_path_query_first" {
            // Unwraps the matched JSONB scalar to text.
            ctx.sql("(").sql(function).sql("(");
            ctx.keyword("CAST(");
            ctx.visit(self.document.as_ref())?;
            ctx.keyword(" AS JSONB), ");
            ctx.inline_value(&SqlValue::Text(self.path.clone()));
            ctx.sql(") #>> '{}')");
        } else {
            ctx.sql(function).sql("(");
            ctx.visit(self.document.as_ref())?;
            ctx.sql(", ");
            ctx.inline_value(&SqlValue::Text(self.path.clone()));
            ctx.sql(")");
        }
        if let Some(data_type) = &self.returning {
            ctx.keyword(" AS ").sql(&data_type.cast_target(dialect)).sql(")");
        }
        if let Some(default) = default {
            ctx.sql(", ");
            ctx.visit(default)?;
            ctx.sql(")");
        }
        Ok(())
    }
}

impl From<JsonValue> for Field {
    fn from(value: JsonValue) -> Self {
        Self::JsonValue(value)
    }
}

impl QueryPart for JsonValue {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        match emulation::json_value(ctx.dialect()) {
            JsonValueStrategy::Standard => self.render_standard(ctx),
            JsonValueStrategy::Substitute(function) => self.render_substitute(ctx, function),
            JsonValueStrategy::Unsupported => {
                Err(RenderError::unsupported("JSON_VALUE", ctx.dialect()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::qom::{col, val};
    use crate::render::Renderer;

    fn render(dialect: Dialect, field: &Field) -> String {
        Renderer::new(dialect).render_inlined(field).unwrap()
    }

    fn object() -> JsonObject {
        JsonObject::new([JsonEntry::new("id", col("id")), JsonEntry::new("name", col("name"))])
    }

    #[test]
    fn test_json_object_standard_form() {
        let field = Field::from(object().on_null(JsonOnNull::Absent));
        assert_eq!(
            render(Dialect::Postgres16, &field),
            "JSON_OBJECT(KEY 'id' VALUE id, KEY 'name' VALUE name ABSENT ON NULL)"
        );
        assert_eq!(
            render(Dialect::H2, &Field::from(JsonObject::new([]).on_null(JsonOnNull::Null))),
            "JSON_OBJECT(NULL ON NULL)"
        );
    }

    #[test]
    fn test_json_object_omits_on_null_where_unsupported() {
        let field = Field::from(object().on_null(JsonOnNull::Absent));
        assert_eq!(render(Dialect::MySql8, &field), "JSON_OBJECT('id', id, 'name', name)");
        assert_eq!(render(Dialect::Sqlite, &field), "JSON_OBJECT('id', id, 'name', name)");
    }

    #[test]
    fn test_json_object_keeps_absent_on_null_for_duckdb() {
        let object = JsonObject::new([JsonEntry::new("k", Field::null(DataType::Other))]);
        let field = Field::from(object.on_null(JsonOnNull::Absent));
        assert_eq!(
            render(Dialect::DuckDb, &field),
            "JSON_OBJECT(KEY 'k' VALUE NULL ABSENT ON NULL)"
        );
    }

    #[test]
    fn test_json_object_build_function() {
        let field = Field::from(object());
        assert_eq!(
            render(Dialect::Postgres14, &field),
            "json_build_object('id', id, 'name', name)"
        );
        let field = Field::from(object().on_null(JsonOnNull::Absent));
        assert_eq!(
            render(Dialect::YugabyteDb, &field),
            "json_strip_nulls(json_build_object('id', id, 'name', name))"
        );
    }

    #[test]
    fn test_json_constructors_unsupported() {
        let field = Field::from(object());
        assert_eq!(
            Renderer::new(Dialect::Derby).render(&field),
            Err(RenderError::unsupported("JSON_OBJECT", Dialect::Derby))
        );
        let array = Field::from(JsonArray::new([val(1)]).on_null(JsonOnNull::Absent));
        assert_eq!(
            Renderer::new(Dialect::Postgres14).render(&array),
            Err(RenderError::unsupported("JSON_ARRAY ABSENT ON NULL", Dialect::Postgres14))
        );
    }

    #[test]
    fn test_json_array() {
        let field = Field::from(JsonArray::new([val(1), col("b")]).on_null(JsonOnNull::Null));
        assert_eq!(render(Dialect::Trino, &field), "JSON_ARRAY(1, b NULL ON NULL)");
        assert_eq!(render(Dialect::MariaDb, &field), "JSON_ARRAY(1, b)");
        assert_eq!(render(Dialect::Postgres14, &field), "json_build_array(1, b)");
    }

    #[test]
    fn test_json_value_standard() {
        let field = Field::from(
            JsonValue::new(col("doc"), "$.a")
                .with_returning(DataType::Integer)
                .with_on_empty(JsonOnEmpty::Null),
        );
        assert_eq!(
            render(Dialect::H2, &field),
            "JSON_VALUE(doc, '$.a' RETURNING INTEGER NULL ON EMPTY)"
        );
        assert_eq!(
            render(Dialect::Trino, &field),
            "JSON_VALUE(doc, '$.a' RETURNING INTEGER)"
        );
        assert_eq!(field.data_type(), DataType::Integer);
    }

    #[test]
    fn test_json_value_substitutes() {
        let field = Field::from(
            JsonValue::new(col("doc"), "$.a")
                .with_on_empty(JsonOnEmpty::Default(Box::new(val("none")))),
        );
        assert_eq!(
            render(Dialect::Sqlite, &field),
            "COALESCE(json_extract(doc, '$.a'), 'none')"
        );
        let field = Field::from(JsonValue::new(col("doc"), "$.a").with_returning(DataType::Integer));
        assert_eq!(
            render(Dialect::Postgres16, &field),
            "CAST((jsonb_path_query_first(CAST(doc AS JSONB), '$.a') #>> '{}') AS INTEGER)"
        );
    }

    #[test]
    fn test_json_value_error_on_empty_needs_native_support() {
        let field = Field::from(JsonValue::new(col("doc"), "$.a").with_on_empty(JsonOnEmpty::Error));
        assert_eq!(
            Renderer::new(Dialect::Sqlite).render(&field),
            Err(RenderError::unsupported("JSON_VALUE ERROR ON EMPTY", Dialect::Sqlite))
        );
        assert_eq!(
            Renderer::new(Dialect::Firebird4).render(&field),
            Err(RenderError::unsupported("JSON_VALUE", Dialect::Firebird4))
        );
    }
}
