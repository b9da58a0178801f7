//! # sqlexpr
//!
//! > **Expression trees in, dialect-correct SQL out.**
//!
//! sqlexpr is the expression compiler of an ORM query builder. It walks a typed
//! expression tree (the body of a `Where`, `Join` or `Select` lambda), resolves
//! member accesses to aliased columns, folds constant sub-expressions and renders
//! the rest as SQL for the chosen dialect.
//!
//! ## Quick Example
//!
//! ```rust
//! use sqlexpr::prelude::*;
//!
//! let mut schema = SchemaRegistry::new();
//! schema.entity("Orders").field("Freight", HostType::Decimal);
//!
//! let orders = HostType::entity("Orders");
//! let o = Expression::param("o", orders.clone());
//! let predicate = Expression::lambda(
//!     [("o", orders)],
//!     Expression::gt(
//!         Expression::member(o, "Freight", HostType::Decimal),
//!         Expression::typed_constant(0, HostType::Decimal),
//!     ),
//! );
//!
//! let aliases = AliasMap::new().with("Orders", "");
//! let sql = sqlexpr::compile_to_sql(&predicate, &aliases, &schema, &CompilerConfig::default())?;
//! assert_eq!(sql, "(Orders.Freight > 0)");
//! # Ok::<(), sqlexpr::error::CompileError>(())
//! ```
//!
//! ## Fragments
//!
//! | Fragment      | Meaning                                          |
//! |---------------|--------------------------------------------------|
//! | `Sql`         | SQL text, embedded as-is                         |
//! | `EnumColumn`  | Column holding enum values (coerces siblings)    |
//! | `Native`      | Folded host value, rendered by the dialect       |

pub mod alias;
pub mod ast;
pub mod config;
pub mod error;
pub mod eval;
pub mod schema;
pub mod transpiler;

pub mod prelude {
    pub use crate::alias::AliasMap;
    pub use crate::ast::*;
    pub use crate::config::CompilerConfig;
    pub use crate::error::*;
    pub use crate::eval::{Captures, Evaluator, HostEnvironment, NoHost};
    pub use crate::schema::{FieldDef, SchemaRegistry, TypeSchema};
    pub use crate::transpiler::{
        Clause, CompileOptions, Dialect, ExpressionCompiler, Fragment, SqlDialect,
    };
}

use alias::AliasMap;
use ast::Expression;
use config::CompilerConfig;
use error::CompileResult;
use schema::TypeSchema;
use transpiler::ExpressionCompiler;

/// Compile a predicate to SQL with the dialect and options of `config`.
pub fn compile_to_sql(
    node: &Expression,
    aliases: &AliasMap,
    schema: &dyn TypeSchema,
    config: &CompilerConfig,
) -> CompileResult<String> {
    ExpressionCompiler::new(config.dialect_provider(), schema)
        .with_options(config.compile_options())
        .compile_to_sql(node, aliases)
}
