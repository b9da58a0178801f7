use tracing::debug;

use crate::ast::{BinaryOp, Expression, HostType};
use crate::error::{CompileError, CompileResult, EvalError};
use crate::eval::arith;

use super::{ExpressionCompiler, Fragment, Scope, is_column_access};

impl ExpressionCompiler<'_> {
    pub(super) fn visit_binary(
        &self,
        node: &Expression,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
        scope: Scope<'_>,
        depth: usize,
    ) -> CompileResult<Fragment> {
        let token = op.sql_token();
        let (l, r) = if op.is_logical() {
            match self.logical_operands(node, left, right, scope, depth)? {
                Ok(pair) => pair,
                Err(folded) => return Ok(folded),
            }
        } else {
            match self.value_operands(op, left, right, scope, depth)? {
                Ok(pair) => pair,
                Err(folded) => return Ok(folded),
            }
        };
        Ok(Fragment::Sql(emit(&token, &l, &r)))
    }

    /// Operands of `AND`/`OR`. `Err` carries the fragment when the whole node folded.
    fn logical_operands(
        &self,
        node: &Expression,
        left: &Expression,
        right: &Expression,
        scope: Scope<'_>,
        depth: usize,
    ) -> CompileResult<Result<(String, String), Fragment>> {
        let l = self.logical_operand(left, scope, depth)?;
        let r = self.logical_operand(right, scope, depth)?;

        if !l.is_sql() && !r.is_sql() {
            let value = self.fold(node)?;
            debug!(node = %node, value = %value, "folded constant logical expression");
            let sql = self.dialect.render_value(&value, &HostType::Bool);
            return Ok(Err(Fragment::Sql(sql)));
        }
        Ok(Ok((self.predicate_sql(l)?, self.predicate_sql(r)?)))
    }

    fn logical_operand(
        &self,
        side: &Expression,
        scope: Scope<'_>,
        depth: usize,
    ) -> CompileResult<Fragment> {
        if is_column_access(side) {
            self.truthy_column(side, scope)
        } else {
            self.visit(side, scope, depth)
        }
    }

    /// A constant logical operand becomes an always-true or always-false predicate.
    fn predicate_sql(&self, fragment: Fragment) -> CompileResult<String> {
        match fragment {
            Fragment::Native(v) => match v.as_bool() {
                Some(true) => Ok(self.dialect.true_expression()),
                Some(false) => Ok(self.dialect.false_expression()),
                None => Err(CompileError::Evaluation(EvalError::mismatch(format!(
                    "logical operand must be boolean, got {}",
                    v.host_type()
                )))),
            },
            other => Ok(other.into_sql(self.dialect())),
        }
    }

    /// Operands of every other operator. `Err` carries the folded native result.
    fn value_operands(
        &self,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
        scope: Scope<'_>,
        depth: usize,
    ) -> CompileResult<Result<(String, String), Fragment>> {
        let mut l = self.visit(left, scope, depth)?;
        let mut r = self.visit(right, scope, depth)?;

        if l.enum_type().is_some() && r.as_native().is_some() {
            r = self.coerce_enum(&l, r);
        } else if r.enum_type().is_some() && l.as_native().is_some() {
            l = self.coerce_enum(&r, l);
        }

        if let (Fragment::Native(a), Fragment::Native(b)) = (&l, &r) {
            let value = arith::binary(op, a, b)?;
            debug!(%op, value = %value, "folded constant binary expression");
            return Ok(Err(Fragment::Native(value)));
        }
        Ok(Ok((self.fragment_sql(l, left), self.fragment_sql(r, right))))
    }

    /// Render a native sibling of an enum column as the quoted member name.
    fn coerce_enum(&self, column: &Fragment, other: Fragment) -> Fragment {
        let (Some(e), Fragment::Native(v)) = (column.enum_type(), &other) else {
            return other;
        };
        let sql = match v.as_i64() {
            Some(n) => {
                let name = e.name_of(n).map(str::to_string).unwrap_or_else(|| n.to_string());
                self.dialect.quote_string(&name)
            }
            None => self.dialect.render_value(v, &v.host_type()),
        };
        Fragment::Sql(sql)
    }
}

fn emit(token: &str, left: &str, right: &str) -> String {
    let token = match token {
        "=" if right.eq_ignore_ascii_case("null") => "is",
        "<>" if right.eq_ignore_ascii_case("null") => "is not",
        other => other,
    };
    match token {
        "MOD" | "COALESCE" => format!("{}({},{})", token, left, right),
        _ => format!("({} {} {})", left, token, right),
    }
}

#[cfg(test)]
mod tests {
    use super::emit;

    #[test]
    fn test_emit_null_rewrite() {
        assert_eq!(emit("=", "Orders.ShipRegion", "null"), "(Orders.ShipRegion is null)");
        assert_eq!(emit("<>", "Orders.ShipRegion", "NULL"), "(Orders.ShipRegion is not NULL)");
        assert_eq!(emit(">", "Orders.Freight", "null"), "(Orders.Freight > null)");
    }

    #[test]
    fn test_emit_function_operators() {
        assert_eq!(emit("MOD", "Orders.OrderID", "2"), "MOD(Orders.OrderID,2)");
        assert_eq!(
            emit("COALESCE", "Orders.ShipRegion", "'n/a'"),
            "COALESCE(Orders.ShipRegion,'n/a')"
        );
    }
}
