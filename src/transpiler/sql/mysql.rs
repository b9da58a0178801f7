use crate::ast::{HostType, Value};

use super::super::traits::{SqlDialect, quote_with, render_generic};

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_with(name, '`', '`')
    }

    /// Backslash is an escape character inside MySQL string literals.
    fn quote_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
    }

    fn render_value(&self, value: &Value, declared: &HostType) -> String {
        match value {
            // TINYINT(1) booleans
            Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            _ => render_generic(self, value, declared),
        }
    }
}
