//! Method calls: `IN` containment, column text functions and `Sql.*` helpers.

use tracing::debug;

use crate::ast::{Expression, HostType, Value};
use crate::error::{CompileError, CompileResult, EvalError};

use super::{ExpressionCompiler, Fragment, Scope, is_column_rooted};

/// Owner type name of the SQL helper functions.
pub const SQL_HELPERS: &str = "Sql";

impl ExpressionCompiler<'_> {
    pub(super) fn visit_call(
        &self,
        node: &Expression,
        scope: Scope<'_>,
        depth: usize,
    ) -> CompileResult<Fragment> {
        let Expression::MethodCall {
            target,
            method,
            arguments,
            owner_type,
            ..
        } = node
        else {
            return Err(CompileError::malformed(format!(
                "expected a method call, found {}",
                node.kind()
            )));
        };

        match target.as_deref() {
            None => {
                if matches!(owner_type, HostType::Object(name) if name == SQL_HELPERS) {
                    if let Some(helper) = self.sql_helper(method, arguments, scope, depth) {
                        return helper;
                    }
                }
                if method == "Contains" && arguments.len() == 2 {
                    return self.containment(node, &arguments[0], &arguments[1], scope, depth);
                }
            }
            Some(receiver) => {
                if method == "Contains" && arguments.len() == 1 && owner_type.is_enumerable() {
                    return self.containment(node, receiver, &arguments[0], scope, depth);
                }
                if is_column_rooted(receiver) {
                    return self.column_method(receiver, method, arguments, scope, depth);
                }
            }
        }

        debug!(call = %node, "evaluating method call natively");
        self.fold(node).map(Fragment::Native)
    }

    /// `collection.Contains(column)` in either static or instance form.
    fn containment(
        &self,
        node: &Expression,
        probe: &Expression,
        column: &Expression,
        scope: Scope<'_>,
        depth: usize,
    ) -> CompileResult<Fragment> {
        let column = self.visit(column, scope, depth)?;
        if !column.is_sql() {
            return self.fold(node).map(Fragment::Native);
        }
        let values = self.fold(probe)?;
        Ok(self.in_list(values, column))
    }

    /// `<column> In (<elements>)`, flattening one level of nested collections.
    pub(super) fn in_list(&self, values: Value, column: Fragment) -> Fragment {
        let items = match values {
            Value::List(items) => items,
            Value::Null => Vec::new(),
            scalar => vec![scalar],
        };
        let mut flat = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::List(inner) => flat.extend(inner),
                scalar => flat.push(scalar),
            }
        }

        let enum_type = column.enum_type().map(|e| HostType::Enum(e.clone()));
        let rendered: Vec<String> = flat
            .iter()
            .map(|v| match (&enum_type, v) {
                (Some(ty), Value::Int(_)) => self.dialect.render_value(v, ty),
                _ => self.dialect.render_value(v, &v.host_type()),
            })
            .collect();
        let elements = if rendered.is_empty() {
            "NULL".to_string()
        } else {
            rendered.join(",")
        };
        Fragment::Sql(format!(
            "{} In ({})",
            column.into_sql(self.dialect()),
            elements
        ))
    }

    fn column_method(
        &self,
        receiver: &Expression,
        method: &str,
        arguments: &[Expression],
        scope: Scope<'_>,
        depth: usize,
    ) -> CompileResult<Fragment> {
        let col = match self.visit(receiver, scope, depth)? {
            Fragment::Native(_) => {
                return Err(CompileError::malformed(format!(
                    "receiver of '{}' did not compile to a column: {}",
                    method, receiver
                )));
            }
            sql => sql.into_sql(self.dialect()),
        };

        let sql = match method {
            "Trim" => format!("ltrim(rtrim({}))", col),
            "LTrim" => format!("ltrim({})", col),
            "RTrim" => format!("rtrim({})", col),
            "ToUpper" => format!("upper({})", col),
            "ToLower" => format!("lower({})", col),
            "StartsWith" | "EndsWith" | "Contains" => {
                let arg = self.native_arg(method, &col, arguments, 0, scope, depth)?;
                self.like(&col, method, &arg.to_string())
            }
            "Substring" => {
                let start = self.integer_arg(method, &col, arguments, 0, scope, depth)?;
                let len = if arguments.len() > 1 {
                    Some(self.integer_arg(method, &col, arguments, 1, scope, depth)?)
                } else {
                    None
                };
                if start < 0 || len.is_some_and(|n| n < 0) {
                    return Err(EvalError::InvalidArgument(format!(
                        "'{}' on {} needs a non-negative start and length",
                        method, col
                    ))
                    .into());
                }
                let from = start
                    .checked_add(1)
                    .ok_or_else(|| EvalError::Overflow(method.to_string()))?;
                match len {
                    Some(len) => format!("substring({} from {} for {})", col, from, len),
                    None => format!("substring({} from {})", col, from),
                }
            }
            _ => return Err(CompileError::unsupported(method, col)),
        };
        Ok(Fragment::Sql(sql))
    }

    fn like(&self, col: &str, method: &str, arg: &str) -> String {
        let mut escaped = self.dialect.escape_wildcards(arg);
        let col = if self.options.strip_upper_in_like {
            col.to_string()
        } else {
            escaped = escaped.to_uppercase();
            format!("upper({})", col)
        };
        let pattern = match method {
            "StartsWith" => format!("{}%", escaped),
            "EndsWith" => format!("%{}", escaped),
            _ => format!("%{}%", escaped),
        };
        let mut sql = format!("{} like {}", col, self.dialect.quote_string(&pattern));
        if escaped.contains('^') {
            sql.push_str(" escape '^'");
        }
        sql
    }

    /// A column-method argument; it must fold to a host value.
    fn native_arg(
        &self,
        method: &str,
        col: &str,
        arguments: &[Expression],
        index: usize,
        scope: Scope<'_>,
        depth: usize,
    ) -> CompileResult<Value> {
        let arg = arguments.get(index).ok_or_else(|| {
            CompileError::malformed(format!(
                "'{}' on {} is missing argument {}",
                method, col, index
            ))
        })?;
        match self.visit(arg, scope, depth)? {
            Fragment::Native(v) => Ok(v),
            _ => Err(CompileError::unsupported(method, col)),
        }
    }

    fn integer_arg(
        &self,
        method: &str,
        col: &str,
        arguments: &[Expression],
        index: usize,
        scope: Scope<'_>,
        depth: usize,
    ) -> CompileResult<i64> {
        self.native_arg(method, col, arguments, index, scope, depth)?
            .as_i64()
            .ok_or_else(|| {
                CompileError::malformed(format!(
                    "'{}' argument {} must be an integer",
                    method, index
                ))
            })
    }

    /// `Sql.In`, `Sql.Desc`, `Sql.As` and aggregate helpers. `None` for other names.
    fn sql_helper(
        &self,
        method: &str,
        arguments: &[Expression],
        scope: Scope<'_>,
        depth: usize,
    ) -> Option<CompileResult<Fragment>> {
        let first = arguments.first()?;
        let unary = |template: fn(&str) -> String| -> CompileResult<Fragment> {
            let arg = self.helper_arg(first, scope, depth)?;
            Ok(Fragment::Sql(template(&arg)))
        };
        let result = match method {
            "In" => self.helper_in(first, &arguments[1..], scope, depth),
            "Desc" => unary(|c| format!("{} DESC", c)),
            "Count" => unary(|c| format!("COUNT({})", c)),
            "CountDistinct" => unary(|c| format!("COUNT(DISTINCT {})", c)),
            "Sum" => unary(|c| format!("SUM({})", c)),
            "Avg" => unary(|c| format!("AVG({})", c)),
            "Min" => unary(|c| format!("MIN({})", c)),
            "Max" => unary(|c| format!("MAX({})", c)),
            "As" => self.helper_as(first, arguments.get(1), scope, depth),
            _ => return None,
        };
        Some(result)
    }

    fn helper_in(
        &self,
        column: &Expression,
        values: &[Expression],
        scope: Scope<'_>,
        depth: usize,
    ) -> CompileResult<Fragment> {
        let column = self.visit(column, scope, depth)?;
        let values = values
            .iter()
            .map(|e| self.fold(e))
            .collect::<CompileResult<Vec<_>>>()?;
        Ok(self.in_list(Value::List(values), column))
    }

    fn helper_as(
        &self,
        column: &Expression,
        alias: Option<&Expression>,
        scope: Scope<'_>,
        depth: usize,
    ) -> CompileResult<Fragment> {
        let col = self.helper_arg(column, scope, depth)?;
        let alias =
            alias.ok_or_else(|| CompileError::malformed("Sql.As requires an alias argument"))?;
        let alias = self.fold(alias)?.to_string();
        Ok(Fragment::Sql(format!(
            "{} AS {}",
            col,
            self.dialect.quote_identifier(&alias)
        )))
    }

    /// Helper argument text: compiled SQL, or a host string taken as raw SQL (`"*"`).
    fn helper_arg(
        &self,
        arg: &Expression,
        scope: Scope<'_>,
        depth: usize,
    ) -> CompileResult<String> {
        Ok(match self.visit(arg, scope, depth)? {
            Fragment::Native(Value::String(raw)) => raw,
            Fragment::Native(v) => self.dialect.render_value(&v, &v.host_type()),
            sql => sql.into_sql(self.dialect()),
        })
    }
}
