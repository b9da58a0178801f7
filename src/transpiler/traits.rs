//! Dialect provider trait and identifier quoting utilities.

use crate::ast::{HostType, Value};

/// SQL reserved words that must be quoted when used as identifiers.
pub const RESERVED_WORDS: &[&str] = &[
    "order",
    "group",
    "user",
    "table",
    "select",
    "from",
    "where",
    "join",
    "left",
    "right",
    "inner",
    "outer",
    "on",
    "and",
    "or",
    "not",
    "null",
    "true",
    "false",
    "as",
    "in",
    "is",
    "like",
    "between",
    "having",
    "union",
    "all",
    "distinct",
    "case",
    "when",
    "then",
    "else",
    "end",
    "insert",
    "update",
    "delete",
    "index",
    "key",
    "primary",
    "default",
    "check",
    "level",
    "size",
    "date",
    "number",
    "comment",
    "uid",
    "rowid",
];

/// Identifier needs quoting: reserved word, special characters, or a leading digit.
pub fn needs_quoting(name: &str) -> bool {
    let lower = name.to_lowercase();
    RESERVED_WORDS.contains(&lower.as_str())
        || name.is_empty()
        || name.chars().any(|c| !c.is_alphanumeric() && c != '_')
        || name.chars().next().map(|c| c.is_numeric()).unwrap_or(false)
}

/// Wrap an identifier in `open`/`close`, doubling any embedded `close`.
pub fn quote_with(name: &str, open: char, close: char) -> String {
    let doubled: String = [close, close].iter().collect();
    format!("{}{}{}", open, name.replace(close, &doubled), close)
}

/// Double-quote an identifier only if it needs it.
pub fn escape_identifier(name: &str) -> String {
    if needs_quoting(name) {
        quote_with(name, '"', '"')
    } else {
        name.to_string()
    }
}

/// Renders typed values and identifiers into SQL-safe text for one dialect.
///
/// Providers are immutable and shared across compilations.
pub trait SqlDialect: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Quote an identifier (table, alias or column name).
    fn quote_identifier(&self, name: &str) -> String {
        escape_identifier(name)
    }

    fn column_name(&self, name: &str) -> String {
        self.quote_identifier(name)
    }

    /// `table.column`, each part quoted by the dialect.
    fn qualified_column(&self, table: &str, name: &str) -> String {
        format!("{}.{}", self.quote_identifier(table), self.column_name(name))
    }

    /// Single-quoted string literal. Quotes are doubled exactly once.
    fn quote_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }

    /// Whether values of a declared type are emitted quoted.
    /// Integer, real, decimal and bool column kinds never are.
    fn should_quote(&self, ty: &HostType) -> bool {
        !(ty.is_numeric() || matches!(ty.underlying(), HostType::Bool))
    }

    /// Render a host value as a SQL literal, routed by its declared type.
    fn render_value(&self, value: &Value, declared: &HostType) -> String {
        render_generic(self, value, declared)
    }

    fn true_literal(&self) -> String {
        self.render_value(&Value::Bool(true), &HostType::Bool)
    }

    fn false_literal(&self) -> String {
        self.render_value(&Value::Bool(false), &HostType::Bool)
    }

    /// Always-true predicate, standing in for a constant `true` operand.
    fn true_expression(&self) -> String {
        let t = self.true_literal();
        format!("({}={})", t, t)
    }

    /// Always-false predicate, standing in for a constant `false` operand.
    fn false_expression(&self) -> String {
        format!("({}={})", self.true_literal(), self.false_literal())
    }

    /// Escape LIKE wildcards with `^`. Pair with ` escape '^'`.
    fn escape_wildcards(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for c in value.chars() {
            if matches!(c, '^' | '\\' | '_' | '%') {
                out.push('^');
            }
            out.push(c);
        }
        out
    }
}

/// Invariant numeric text of a numeric value.
pub fn numeric_text(value: &Value) -> Option<String> {
    match value {
        Value::Int(n) => Some(n.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Decimal(d) => Some(d.to_string()),
        Value::Enum { value, .. } => Some(value.to_string()),
        _ => None,
    }
}

/// Base value rendering shared by every dialect; derived dialects special-case
/// some types and delegate the rest here.
pub fn render_generic<D: SqlDialect + ?Sized>(
    dialect: &D,
    value: &Value,
    declared: &HostType,
) -> String {
    if value.is_null() {
        return "NULL".to_string();
    }
    let runtime = value.host_type();
    let ty = match declared.underlying() {
        HostType::Null => &runtime,
        other => other,
    };

    if ty.is_floating() {
        if let Some(text) = numeric_text(value) {
            return text;
        }
    }
    if ty.is_integer() {
        if let Some(n) = value.as_i64() {
            return n.to_string();
        }
    }
    if matches!(ty, HostType::TimeSpan) {
        match value {
            Value::TimeSpan(ts) => return ts.ticks().to_string(),
            Value::Int(n) => return n.to_string(),
            _ => {}
        }
    }

    match value {
        Value::List(_) | Value::Object(_) => {
            let json = serde_json::to_string(value).unwrap_or_else(|_| value.to_string());
            return dialect.quote_string(&json);
        }
        Value::Int(n) => {
            if let Some(e) = ty.as_enum() {
                let text = e
                    .name_of(*n)
                    .map(str::to_string)
                    .unwrap_or_else(|| n.to_string());
                return dialect.quote_string(&text);
            }
        }
        _ => {}
    }

    let text = value.to_string();
    if dialect.should_quote(ty) {
        dialect.quote_string(&text)
    } else {
        text
    }
}
