use tracing::debug;

use crate::ast::Expression;
use crate::error::{CompileError, CompileResult};

use super::{ExpressionCompiler, Fragment, Scope};

impl ExpressionCompiler<'_> {
    /// `New`, `NewArray` and `MemberInit`: folded when possible.
    ///
    /// A construction that reads the query parameter cannot be evaluated; it is a
    /// field projection and becomes the comma-joined list of its parts.
    pub(super) fn visit_construct(
        &self,
        node: &Expression,
        scope: Scope<'_>,
        depth: usize,
    ) -> CompileResult<Fragment> {
        let err = match self.fold(node) {
            Ok(value) => return Ok(Fragment::Native(value)),
            Err(CompileError::Evaluation(e)) if e.is_invalid_operation() => e,
            Err(e) => return Err(e),
        };
        debug!(node = %node, reason = %err, "compiling construction as a field list");

        let parts: Vec<&Expression> = match node {
            Expression::New { arguments, .. } => arguments.iter().collect(),
            Expression::NewArray { elements, .. } => elements.iter().collect(),
            Expression::MemberInit { bindings, .. } => bindings.iter().map(|(_, e)| e).collect(),
            other => {
                return Err(CompileError::malformed(format!(
                    "expected a construction, found {}",
                    other.kind()
                )));
            }
        };

        let mut rendered = Vec::with_capacity(parts.len());
        for part in parts {
            let fragment = self.visit(part, scope, depth)?;
            rendered.push(self.fragment_sql(fragment, part));
        }
        Ok(Fragment::Sql(rendered.join(",")))
    }
}
