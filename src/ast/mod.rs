//! Expression-tree data model: host types, host values, operators and nodes.

pub mod expr;
pub mod operators;
pub mod types;
pub mod values;

pub use expr::*;
pub use operators::*;
pub use types::*;
pub use values::*;
