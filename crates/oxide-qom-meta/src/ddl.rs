//! Recovers column types from `CREATE TABLE` and `CREATE VIEW` statements.
//!
//! SQLite does not report a declared type for every column: view columns
//! computed by expressions and some virtual table columns come back blank.
//! This module reads the creation statement kept in `sqlite_master` and
//! extracts column declarations and `CAST(... AS type)` targets. It is not a
//! general SQL parser; anything it cannot follow is reported as a
//! [`DdlError`] so the caller can fall back to an unknown type.

use std::sync::LazyLock;

use regex::Regex;

/// Errors raised while interpreting a creation statement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DdlError {
    /// The statement does not have a recognised shape.
    #[error("Cannot parse SQL: {0}")]
    Parse(String),

    /// The statement parsed but its columns cannot be derived.
    #[error("Cannot interpret SQL: {0}")]
    Interpret(String),
}

static CREATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)^\s*CREATE\s+(?:TEMP(?:ORARY)?\s+)?(TABLE|VIEW)\s+(?:IF\s+NOT\s+EXISTS\s+)?((?:"(?:[^"]|"")+"|`[^`]+`|\[[^\]]+\]|[\w$]+)(?:\s*\.\s*(?:"(?:[^"]|"")+"|`[^`]+`|\[[^\]]+\]|[\w$]+))?)\s*"#,
    )
    .expect("valid CREATE regex")
});

static VIEW_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^(?:\(([^)]*)\)\s*)?AS\s+SELECT\s+(?:DISTINCT\s+|ALL\s+)?(.*)$")
        .expect("valid view regex")
});

static CAST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^CAST\s*\(.*\bAS\s+([A-Za-z_][\w ]*?)\s*(\(\s*\d+\s*(?:,\s*\d+\s*)?\))?\s*\)$")
        .expect("valid CAST regex")
});

static ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)^(.*?)\s+(?:AS\s+)?("(?:[^"]|"")+"|`[^`]+`|\[[^\]]+\]|[A-Za-z_]\w*)$"#)
        .expect("valid alias regex")
});

static QUALIFIED_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:[\w$]+|"(?:[^"]|"")+")(?:\s*\.\s*(?:[\w$]+|"(?:[^"]|"")+"))*$"#)
        .expect("valid column regex")
});

static PRECISION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(\s*(\d+)\s*(?:,\s*(\d+)\s*)?\)")
        .expect("valid precision regex")
});

static WITHOUT_ROWID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bWITHOUT\s+ROWID\b").expect("valid WITHOUT ROWID regex")
});

/// Words that end a column's type name and begin its constraints.
const CONSTRAINT_WORDS: &[&str] = &[
    "CONSTRAINT",
    "PRIMARY",
    "NOT",
    "NULL",
    "UNIQUE",
    "CHECK",
    "DEFAULT",
    "COLLATE",
    "REFERENCES",
    "GENERATED",
    "AS",
];

/// Words after which the next word still belongs to the expression.
const OPERATOR_WORDS: &[&str] = &[
    "NOT", "AND", "OR", "IS", "LIKE", "GLOB", "IN", "BETWEEN", "CASE", "WHEN", "THEN", "ELSE",
    "DISTINCT", "COLLATE", "ESCAPE",
];

/// Words that start a table constraint rather than a column definition.
const TABLE_CONSTRAINT_WORDS: &[&str] = &["CONSTRAINT", "PRIMARY", "UNIQUE", "CHECK", "FOREIGN"];

/// The kind of object a statement creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// `CREATE TABLE`.
    Table,
    /// `CREATE VIEW`.
    View,
}

/// A column as declared in a creation statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredColumn {
    /// Column name, unquoted.
    pub name: String,
    /// Type name without its precision suffix. Empty if none was declared.
    pub type_name: String,
    /// Declared precision or length.
    pub precision: Option<u32>,
    /// Declared scale.
    pub scale: Option<u32>,
    /// The full column definition or select list entry.
    pub declaration: String,
}

impl DeclaredColumn {
    /// Returns whether the declaration carries an `AUTOINCREMENT` token.
    #[must_use]
    pub fn is_autoincrement(&self) -> bool {
        words(&self.declaration).any(|w| w.eq_ignore_ascii_case("AUTOINCREMENT"))
    }
}

/// The columns recovered from one creation statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpretedTable {
    /// Object name, unquoted.
    pub name: String,
    /// Table or view.
    pub kind: ObjectKind,
    /// Columns in declaration order.
    pub columns: Vec<DeclaredColumn>,
    /// Whether the table was declared `WITHOUT ROWID`.
    pub without_rowid: bool,
}

impl InterpretedTable {
    /// Looks up a column by name, ignoring ASCII case as SQLite does.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&DeclaredColumn> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Returns whether a creation statement declares `WITHOUT ROWID`.
#[must_use]
pub fn is_without_rowid(source: &str) -> bool {
    WITHOUT_ROWID.is_match(source)
}

/// Interprets a `CREATE TABLE` or `CREATE VIEW` statement.
///
/// # Errors
///
/// Returns [`DdlError::Parse`] for statements of another shape and
/// [`DdlError::Interpret`] when the columns cannot be derived, such as a
/// view selecting `*`.
pub fn interpret(source: &str) -> Result<InterpretedTable, DdlError> {
    let captures = CREATE
        .captures(source)
        .ok_or_else(|| DdlError::Parse(String::from("expected CREATE TABLE or CREATE VIEW")))?;
    let kind = if captures[1].eq_ignore_ascii_case("VIEW") {
        ObjectKind::View
    } else {
        ObjectKind::Table
    };
    let name = last_name_part(&captures[2]).unwrap_or_default();
    let rest = &source[captures.get(0).map_or(0, |m| m.end())..];

    match kind {
        ObjectKind::Table => interpret_table(name, rest),
        ObjectKind::View => interpret_view(name, rest),
    }
}

fn interpret_table(name: String, rest: &str) -> Result<InterpretedTable, DdlError> {
    let Some(body) = rest.strip_prefix('(') else {
        return Err(DdlError::Interpret(String::from(
            "table has no column list (CREATE TABLE ... AS SELECT is not supported)",
        )));
    };
    let close = matching_paren(body)
        .ok_or_else(|| DdlError::Parse(String::from("unbalanced parentheses in column list")))?;

    let mut columns = Vec::new();
    for element in split_top_level(&body[..close], ',') {
        let element = element.trim();
        let first = words(element).next().unwrap_or_default();
        if TABLE_CONSTRAINT_WORDS
            .iter()
            .any(|w| w.eq_ignore_ascii_case(first))
        {
            continue;
        }
        columns.push(column_definition(element)?);
    }
    if columns.is_empty() {
        return Err(DdlError::Interpret(format!("table {name} declares no columns")));
    }

    Ok(InterpretedTable {
        name,
        kind: ObjectKind::Table,
        columns,
        without_rowid: is_without_rowid(&body[close..]),
    })
}

fn column_definition(element: &str) -> Result<DeclaredColumn, DdlError> {
    let (name, mut rest) = leading_identifier(element)
        .ok_or_else(|| DdlError::Parse(format!("expected a column name in '{element}'")))?;

    let mut type_words = Vec::new();
    let mut precision = None;
    let mut scale = None;
    loop {
        rest = rest.trim_start();
        if rest.starts_with('(') {
            if type_words.is_empty() {
                break;
            }
            if let Some(c) = PRECISION.captures(rest) {
                precision = c.get(1).and_then(|m| m.as_str().parse().ok());
                scale = c.get(2).and_then(|m| m.as_str().parse().ok());
            }
            break;
        }
        let word_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let word = &rest[..word_len];
        if word.is_empty()
            || CONSTRAINT_WORDS
                .iter()
                .any(|w| w.eq_ignore_ascii_case(word))
        {
            break;
        }
        type_words.push(word);
        rest = &rest[word_len..];
    }

    Ok(DeclaredColumn {
        name,
        type_name: type_words.join(" "),
        precision,
        scale,
        declaration: element.to_string(),
    })
}

fn interpret_view(name: String, rest: &str) -> Result<InterpretedTable, DdlError> {
    let captures = VIEW_BODY
        .captures(rest)
        .ok_or_else(|| DdlError::Parse(String::from("expected AS SELECT after view name")))?;
    let renamed: Vec<String> = captures
        .get(1)
        .map(|m| {
            split_top_level(m.as_str(), ',')
                .map(|c| unquote(c.trim()))
                .collect()
        })
        .unwrap_or_default();
    let list = captures.get(2).map_or("", |m| m.as_str());
    let list = &list[..find_keyword(list, "FROM").unwrap_or(list.len())];

    let mut columns = Vec::new();
    for (i, item) in split_top_level(list, ',').enumerate() {
        let item = item.trim();
        if item == "*" || item.ends_with(".*") {
            return Err(DdlError::Interpret(format!(
                "view {name} selects '{item}', whose columns are not known"
            )));
        }
        let (expression, alias) = split_alias(item);
        let column_name = renamed.get(i).cloned().or(alias).unwrap_or_else(|| {
            if QUALIFIED_COLUMN.is_match(expression) {
                last_name_part(expression).unwrap_or_else(|| expression.to_string())
            } else {
                expression.to_string()
            }
        });

        let (type_name, precision, scale) = CAST.captures(expression).map_or_else(
            || (String::new(), None, None),
            |c| {
                let suffix = c.get(2).and_then(|m| PRECISION.captures(m.as_str()));
                (
                    c[1].trim().to_string(),
                    suffix
                        .as_ref()
                        .and_then(|s| s.get(1))
                        .and_then(|m| m.as_str().parse().ok()),
                    suffix
                        .as_ref()
                        .and_then(|s| s.get(2))
                        .and_then(|m| m.as_str().parse().ok()),
                )
            },
        );

        columns.push(DeclaredColumn {
            name: column_name,
            type_name,
            precision,
            scale,
            declaration: item.to_string(),
        });
    }
    if columns.is_empty() {
        return Err(DdlError::Interpret(format!("view {name} selects no columns")));
    }

    Ok(InterpretedTable {
        name,
        kind: ObjectKind::View,
        columns,
        without_rowid: false,
    })
}

/// Splits `expr AS alias` or `expr alias` into its parts. A trailing word
/// that is part of the expression (`CAST(a AS INT)`, `a.b`) is not an alias.
fn split_alias(item: &str) -> (&str, Option<String>) {
    let Some(c) = ALIAS.captures(item) else {
        return (item, None);
    };
    let (Some(expression), Some(alias)) = (c.get(1), c.get(2)) else {
        return (item, None);
    };
    let expression = expression.as_str().trim();
    let alias_is_keyword = CONSTRAINT_WORDS
        .iter()
        .chain(["END", "ASC", "DESC"].iter())
        .any(|w| w.eq_ignore_ascii_case(alias.as_str()));
    let expression_continues = expression.ends_with(|c: char| "+-*/%|&<>=,(~!".contains(c))
        || words(expression).last().is_some_and(|last| {
            OPERATOR_WORDS
                .iter()
                .any(|w| w.eq_ignore_ascii_case(last))
        });
    if matching_depth(expression) == 0
        && !alias_is_keyword
        && !expression_continues
        && !expression.is_empty()
    {
        (expression, Some(unquote(alias.as_str())))
    } else {
        (item, None)
    }
}

/// Returns the byte offset of the `)` closing a group whose `(` has already
/// been consumed.
fn matching_paren(s: &str) -> Option<usize> {
    let mut depth = 0_usize;
    let mut quote = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, '[') => quote = Some(']'),
            (None, '(') => depth += 1,
            (None, ')') if depth == 0 => return Some(i),
            (None, ')') => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Net parenthesis depth of `s`, ignoring quoted text.
fn matching_depth(s: &str) -> isize {
    let mut depth = 0;
    let mut quote = None;
    for c in s.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// Splits on `separator` outside parentheses and quotes.
fn split_top_level(s: &str, separator: char) -> impl Iterator<Item = &str> {
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut quote = None;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, '[') => quote = Some(']'),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, c) if c == separator && depth == 0 => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts.into_iter().filter(|p| !p.trim().is_empty())
}

/// Finds `keyword` as a whole word outside parentheses and quotes.
fn find_keyword(s: &str, keyword: &str) -> Option<usize> {
    let mut depth = 0_usize;
    let mut quote = None;
    let bytes = s.as_bytes();
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, _) if depth == 0 => {
                let end = i + keyword.len();
                let boundary_before = i == 0 || !is_word_byte(bytes[i - 1]);
                let boundary_after = end >= s.len() || !is_word_byte(bytes[end]);
                if boundary_before
                    && boundary_after
                    && s.get(i..end)
                        .is_some_and(|w| w.eq_ignore_ascii_case(keyword))
                {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

const fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Reads a possibly quoted identifier at the start of `s`.
fn leading_identifier(s: &str) -> Option<(String, &str)> {
    let s = s.trim_start();
    let close = match s.chars().next()? {
        '"' => '"',
        '`' => '`',
        '[' => ']',
        _ => {
            let end = s
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
                .unwrap_or(s.len());
            return (end > 0).then(|| (s[..end].to_string(), &s[end..]));
        }
    };
    let mut end = None;
    let mut chars = s.char_indices().skip(1).peekable();
    while let Some((i, c)) = chars.next() {
        if c == close {
            if close == '"' && chars.peek().is_some_and(|(_, n)| *n == '"') {
                chars.next();
                continue;
            }
            end = Some(i);
            break;
        }
    }
    let end = end?;
    Some((unquote(&s[..=end]), &s[end + 1..]))
}

/// Returns the last part of a dotted, possibly quoted name.
fn last_name_part(s: &str) -> Option<String> {
    let (mut name, mut rest) = leading_identifier(s)?;
    while let Some(next) = rest.trim_start().strip_prefix('.') {
        let (part, remaining) = leading_identifier(next)?;
        name = part;
        rest = remaining;
    }
    Some(name)
}

fn unquote(s: &str) -> String {
    let mut chars = s.chars();
    match (chars.next(), chars.next_back()) {
        (Some('"'), Some('"')) => s[1..s.len() - 1].replace("\"\"", "\""),
        (Some('`'), Some('`')) | (Some('['), Some(']')) => s[1..s.len() - 1].to_string(),
        _ => s.to_string(),
    }
}

fn words(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
}
