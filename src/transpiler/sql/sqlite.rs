use crate::ast::{HostType, Value};

use super::super::traits::{SqlDialect, quote_with, render_generic};

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_with(name, '"', '"')
    }

    fn render_value(&self, value: &Value, declared: &HostType) -> String {
        match value {
            Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            _ => render_generic(self, value, declared),
        }
    }
}
