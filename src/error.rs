//! Error types for sqlexpr.

use thiserror::Error;

/// Failure while compiling an expression tree to SQL.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A column-access method call with no SQL template.
    #[error("Unsupported operation: '{method}' on {receiver}")]
    UnsupportedOperation { method: String, receiver: String },

    /// Native evaluation of a constant sub-expression failed.
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvalError),

    /// A structural assumption about the tree did not hold.
    #[error("Malformed expression: {0}")]
    MalformedExpression(String),

    #[error("Expression nesting exceeds the maximum depth of {limit}")]
    DepthExceeded { limit: usize },
}

impl CompileError {
    pub fn unsupported(method: impl Into<String>, receiver: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            method: method.into(),
            receiver: receiver.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedExpression(message.into())
    }
}

/// Failure while evaluating a sub-expression as a host value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// The expression cannot be computed outside a query (e.g. it reads the query parameter).
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Unknown member '{member}' on {owner}")]
    UnknownMember { owner: String, member: String },

    #[error("Unknown method '{method}' on {owner}")]
    UnknownMethod { owner: String, method: String },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Null reference: {0}")]
    NullReference(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Division by zero")]
    DivideByZero,

    #[error("Arithmetic overflow in {0}")]
    Overflow(String),

    #[error("Expression nesting exceeds the maximum depth of {limit}")]
    DepthExceeded { limit: usize },

    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    /// Raised by a host environment callback.
    #[error("Host error: {0}")]
    Host(String),
}

impl EvalError {
    pub fn mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch(message.into())
    }

    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, EvalError::InvalidOperation(_))
    }
}

/// Failure while loading compiler configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;

/// Result type alias for native evaluation.
pub type EvalResult<T> = Result<T, EvalError>;
