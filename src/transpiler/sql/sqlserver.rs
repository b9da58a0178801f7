use crate::ast::{HostType, Value};

use super::super::traits::{SqlDialect, quote_with, render_generic};

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl SqlDialect for SqlServerDialect {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_with(name, '[', ']')
    }

    fn render_value(&self, value: &Value, declared: &HostType) -> String {
        match value {
            // BIT columns
            Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            Value::DateTime(dt) => {
                self.quote_string(&dt.format("%Y%m%d %H:%M:%S%.3f").to_string())
            }
            _ => render_generic(self, value, declared),
        }
    }
}
