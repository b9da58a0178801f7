//! Expression-tree to SQL compiler.
//!
//! Lowers an [`Expression`] into a [`Fragment`] given an [`AliasMap`], a
//! [`TypeSchema`] for column metadata and a [`SqlDialect`] for literal rendering.

pub mod dialect;
pub mod fragment;
pub mod sql;
pub mod traits;

mod binary;
mod construct;
mod methods;
mod unary;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use tracing::{debug, trace};

use crate::alias::AliasMap;
use crate::ast::{Expression, HostType, UnaryOp, Value};
use crate::error::{CompileError, CompileResult, EvalError};
use crate::eval::{Evaluator, HostEnvironment, NoHost};
use crate::schema::TypeSchema;

pub use dialect::Dialect;
pub use fragment::Fragment;
pub use traits::{SqlDialect, escape_identifier};

/// Default recursion limit of one compilation.
pub const DEFAULT_MAX_DEPTH: usize = 256;

static NO_HOST: NoHost = NoHost;

/// Per-compiler switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Emit `col like 'x%'` instead of `upper(col) like 'X%'`.
    pub strip_upper_in_like: bool,
    pub max_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            strip_upper_in_like: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Clause the compiled fragment is embedded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clause {
    /// `WHERE`/`ON`/`HAVING`: a bare boolean column becomes `col=<true>`.
    #[default]
    Predicate,
    /// Select list, `ORDER BY`, `GROUP BY`.
    FieldList,
}

/// Read-only state of one compile call.
#[derive(Clone, Copy)]
struct Scope<'s> {
    aliases: &'s AliasMap,
    clause: Clause,
}

/// Compiles expression trees for one dialect and schema.
///
/// Holds no per-call state; one compiler can serve many threads.
pub struct ExpressionCompiler<'a> {
    dialect: Arc<dyn SqlDialect>,
    schema: &'a dyn TypeSchema,
    env: &'a dyn HostEnvironment,
    options: CompileOptions,
}

impl<'a> ExpressionCompiler<'a> {
    pub fn new(dialect: Arc<dyn SqlDialect>, schema: &'a dyn TypeSchema) -> Self {
        Self {
            dialect,
            schema,
            env: &NO_HOST,
            options: CompileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Host capabilities used when folding calls the built-ins do not cover.
    pub fn with_environment(mut self, env: &'a dyn HostEnvironment) -> Self {
        self.env = env;
        self
    }

    pub fn dialect(&self) -> &dyn SqlDialect {
        self.dialect.as_ref()
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile in predicate context.
    pub fn compile(&self, node: &Expression, aliases: &AliasMap) -> CompileResult<Fragment> {
        self.compile_with(node, aliases, Clause::Predicate)
    }

    pub fn compile_with(
        &self,
        node: &Expression,
        aliases: &AliasMap,
        clause: Clause,
    ) -> CompileResult<Fragment> {
        let scope = Scope { aliases, clause };
        self.visit(node, scope, 0)
    }

    /// Compile and stringify in predicate context.
    pub fn compile_to_sql(&self, node: &Expression, aliases: &AliasMap) -> CompileResult<String> {
        self.render(node, aliases, Clause::Predicate)
    }

    pub fn compile_predicate(
        &self,
        node: &Expression,
        aliases: &AliasMap,
    ) -> CompileResult<String> {
        self.render(node, aliases, Clause::Predicate)
    }

    pub fn compile_field_list(
        &self,
        node: &Expression,
        aliases: &AliasMap,
    ) -> CompileResult<String> {
        self.render(node, aliases, Clause::FieldList)
    }

    fn render(
        &self,
        node: &Expression,
        aliases: &AliasMap,
        clause: Clause,
    ) -> CompileResult<String> {
        let sql = self
            .compile_with(node, aliases, clause)?
            .into_sql(self.dialect());
        debug!(dialect = self.dialect.name(), ?clause, %sql, "compiled expression");
        Ok(sql)
    }

    fn visit(&self, node: &Expression, scope: Scope<'_>, depth: usize) -> CompileResult<Fragment> {
        if depth > self.options.max_depth {
            return Err(CompileError::DepthExceeded {
                limit: self.options.max_depth,
            });
        }
        trace!(kind = node.kind(), depth, "visit");
        let next = depth + 1;
        match node {
            Expression::Lambda { body, .. } => {
                if depth == 0 && scope.clause == Clause::Predicate && is_column_access(body) {
                    return self.truthy_column(body, scope);
                }
                self.visit(body, scope, next)
            }
            Expression::MemberAccess { .. } => {
                if is_column_access(node) {
                    self.column(node, scope)
                } else {
                    self.fold(node).map(Fragment::Native)
                }
            }
            Expression::Constant { value, .. } => {
                if value.is_null() {
                    Ok(Fragment::sql("null"))
                } else {
                    self.fold(node).map(Fragment::Native)
                }
            }
            Expression::Binary { op, left, right } => {
                self.visit_binary(node, *op, left, right, scope, next)
            }
            Expression::Unary {
                op,
                operand,
                ty,
                method,
            } => self.visit_unary(node, *op, operand, ty, method.as_deref(), scope, next),
            Expression::Parameter { name, .. } => Ok(Fragment::sql(name.clone())),
            Expression::MethodCall { .. } => self.visit_call(node, scope, next),
            Expression::New { .. }
            | Expression::NewArray { .. }
            | Expression::MemberInit { .. } => {
                self.visit_construct(node, scope, next)
            }
        }
    }

    /// Evaluate a parameter-free sub-tree as a host value.
    fn fold(&self, node: &Expression) -> CompileResult<Value> {
        let value = Evaluator::new(self.env)
            .with_max_depth(self.options.max_depth)
            .evaluate(node)
            .map_err(|e| match e {
                EvalError::DepthExceeded { limit } => CompileError::DepthExceeded { limit },
                e => CompileError::Evaluation(e),
            })?;
        trace!(node = %node, value = %value, "folded constant");
        Ok(value)
    }

    /// Render a column reference for a member access rooted at the query parameter.
    fn column(&self, node: &Expression, scope: Scope<'_>) -> CompileResult<Fragment> {
        let Expression::MemberAccess {
            target,
            member,
            declaring_type,
            member_type,
        } = node
        else {
            return Err(CompileError::malformed(format!(
                "expected a member access, found {}",
                node.kind()
            )));
        };

        let entity = target
            .as_deref()
            .and_then(|t| match t {
                Expression::Unary {
                    op: UnaryOp::Convert,
                    operand,
                    ..
                } => operand.static_type().entity_name().map(str::to_string),
                _ => None,
            })
            .or_else(|| declaring_type.clone())
            .or_else(|| {
                target
                    .as_deref()
                    .and_then(|t| t.static_type().entity_name().map(str::to_string))
            })
            .ok_or_else(|| {
                CompileError::malformed(format!("cannot resolve the declaring type of '{}'", node))
            })?;

        let (column, table, ty) = match self.schema.field(&entity, member) {
            Some(f) => (
                f.column_name.as_str(),
                f.entity_name.as_str(),
                &f.member_type,
            ),
            None => (
                member.as_str(),
                self.schema.table_of(&entity).unwrap_or(entity.as_str()),
                member_type,
            ),
        };

        let sql = match scope.aliases.qualifier(&entity, table) {
            Some(qualifier) => self.dialect.qualified_column(qualifier, column),
            None => self.dialect.column_name(column),
        };
        Ok(match ty.underlying().as_enum() {
            Some(e) => Fragment::EnumColumn {
                sql,
                enum_type: e.clone(),
            },
            None => Fragment::Sql(sql),
        })
    }

    /// `col=<true>` for a bare boolean column used as a predicate.
    fn truthy_column(&self, node: &Expression, scope: Scope<'_>) -> CompileResult<Fragment> {
        let col = self.column(node, scope)?;
        let sql = col.as_sql().unwrap_or_default();
        Ok(Fragment::Sql(format!("{}={}", sql, self.dialect.true_literal())))
    }

    /// Render a native operand for embedding next to SQL, by the node's declared type.
    fn render_native(&self, value: &Value, node: &Expression) -> String {
        let declared = match node.static_type() {
            HostType::Null => value.host_type(),
            ty => ty,
        };
        self.dialect.render_value(value, &declared)
    }

    fn fragment_sql(&self, fragment: Fragment, node: &Expression) -> String {
        match fragment {
            Fragment::Native(v) => self.render_native(&v, node),
            other => other.into_sql(self.dialect()),
        }
    }
}

/// A member access on the query parameter, directly or through a `Convert`.
pub(crate) fn is_column_access(node: &Expression) -> bool {
    match node {
        Expression::MemberAccess {
            target: Some(target),
            ..
        } => match target.as_ref() {
            Expression::Parameter { .. } => true,
            Expression::Unary {
                op: UnaryOp::Convert,
                operand,
                ..
            } => matches!(operand.as_ref(), Expression::Parameter { .. }),
            _ => false,
        },
        _ => false,
    }
}

/// A receiver chain that ends at a column access (`o.Name.Trim().ToUpper()`).
pub(crate) fn is_column_rooted(node: &Expression) -> bool {
    match node {
        Expression::MemberAccess { .. } if is_column_access(node) => true,
        Expression::MethodCall {
            target: Some(t), ..
        } => is_column_rooted(t),
        Expression::Unary {
            op: UnaryOp::Convert,
            operand,
            ..
        } => is_column_rooted(operand),
        _ => false,
    }
}
