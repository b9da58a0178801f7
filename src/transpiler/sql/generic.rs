use super::super::traits::SqlDialect;

/// ANSI-style dialect: identifiers quoted only when needed, booleans as `true`/`false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDialect;

impl SqlDialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }
}
