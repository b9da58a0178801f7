//! Intermediate result of compiling one sub-tree.

use std::sync::Arc;

use crate::ast::{EnumType, Value};

use super::traits::SqlDialect;

/// A compiled sub-expression: SQL text, an enum-typed column, or a folded host value.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// SQL ready to embed as-is. Never re-escaped.
    Sql(String),
    /// A column holding enum values; a sibling constant is coerced to the member name.
    EnumColumn {
        sql: String,
        enum_type: Arc<EnumType>,
    },
    /// A constant sub-expression, not yet rendered.
    Native(Value),
}

impl Fragment {
    pub fn sql(text: impl Into<String>) -> Self {
        Fragment::Sql(text.into())
    }

    pub fn is_sql(&self) -> bool {
        matches!(self, Fragment::Sql(_) | Fragment::EnumColumn { .. })
    }

    /// The SQL text, for `Sql` and `EnumColumn`.
    pub fn as_sql(&self) -> Option<&str> {
        match self {
            Fragment::Sql(s) | Fragment::EnumColumn { sql: s, .. } => Some(s),
            Fragment::Native(_) => None,
        }
    }

    pub fn as_native(&self) -> Option<&Value> {
        match self {
            Fragment::Native(v) => Some(v),
            _ => None,
        }
    }

    pub fn enum_type(&self) -> Option<&Arc<EnumType>> {
        match self {
            Fragment::EnumColumn { enum_type, .. } => Some(enum_type),
            _ => None,
        }
    }

    /// Final SQL text. Natives render through the dialect using their runtime type.
    pub fn into_sql(self, dialect: &dyn SqlDialect) -> String {
        match self {
            Fragment::Sql(s) | Fragment::EnumColumn { sql: s, .. } => s,
            Fragment::Native(v) => dialect.render_value(&v, &v.host_type()),
        }
    }
}

impl From<Value> for Fragment {
    fn from(v: Value) -> Self {
        Fragment::Native(v)
    }
}
