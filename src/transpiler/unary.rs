use crate::ast::{Expression, HostType, UnaryOp};
use crate::error::CompileResult;
use crate::eval::arith;

use super::{ExpressionCompiler, Fragment, Scope, is_column_access};

impl ExpressionCompiler<'_> {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn visit_unary(
        &self,
        node: &Expression,
        op: UnaryOp,
        operand: &Expression,
        ty: &HostType,
        method: Option<&str>,
        scope: Scope<'_>,
        depth: usize,
    ) -> CompileResult<Fragment> {
        match op {
            UnaryOp::Not => {
                let inner = self.visit(operand, scope, depth)?;
                match inner {
                    Fragment::Native(v) => Ok(Fragment::Native(arith::unary(op, v, ty)?)),
                    sql => {
                        let text = if is_column_access(operand) {
                            format!(
                                "{}={}",
                                sql.into_sql(self.dialect()),
                                self.dialect.true_literal()
                            )
                        } else {
                            sql.into_sql(self.dialect())
                        };
                        Ok(Fragment::Sql(format!("NOT ({})", text)))
                    }
                }
            }
            // User-defined conversions are opaque: always evaluated.
            UnaryOp::Convert if method.is_some() => self.fold(node).map(Fragment::Native),
            _ => match self.visit(operand, scope, depth)? {
                Fragment::Native(v) => Ok(Fragment::Native(arith::unary(op, v, ty)?)),
                sql => Ok(sql),
            },
        }
    }
}
