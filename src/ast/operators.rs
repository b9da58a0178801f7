use serde::{Deserialize, Serialize};

/// Binary expression node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    /// Bitwise / non-short-circuit logical and (&)
    And,
    /// Short-circuit and (&&)
    AndAlso,
    /// Bitwise / non-short-circuit logical or (|)
    Or,
    /// Short-circuit or (||)
    OrElse,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Equal,
    NotEqual,
    /// Null coalescing (??)
    Coalesce,
    ArrayIndex,
    BitShiftLeft,
    BitShiftRight,
    ExclusiveOr,
}

impl BinaryOp {
    /// SQL operator token. Kinds without a SQL spelling fall back to their node-kind name.
    pub fn sql_token(&self) -> String {
        let token = match self {
            BinaryOp::Equal => "=",
            BinaryOp::NotEqual => "<>",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::AndAlso => "AND",
            BinaryOp::OrElse => "OR",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "MOD",
            BinaryOp::Coalesce => "COALESCE",
            other => return other.to_string(),
        };
        token.to_string()
    }

    /// Host-language spelling, used by the diagnostic `Display` of expressions.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::And => "&",
            BinaryOp::AndAlso => "&&",
            BinaryOp::Or => "|",
            BinaryOp::OrElse => "||",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Coalesce => "??",
            BinaryOp::ArrayIndex => "[]",
            BinaryOp::BitShiftLeft => "<<",
            BinaryOp::BitShiftRight => ">>",
            BinaryOp::ExclusiveOr => "^",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::LessThan
                | BinaryOp::LessThanOrEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterThanOrEqual
                | BinaryOp::Equal
                | BinaryOp::NotEqual
        )
    }

    /// Short-circuit logical operators (rendered as SQL AND / OR).
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::AndAlso | BinaryOp::OrElse)
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BinaryOp::Add => "Add",
            BinaryOp::Subtract => "Subtract",
            BinaryOp::Multiply => "Multiply",
            BinaryOp::Divide => "Divide",
            BinaryOp::Modulo => "Modulo",
            BinaryOp::And => "And",
            BinaryOp::AndAlso => "AndAlso",
            BinaryOp::Or => "Or",
            BinaryOp::OrElse => "OrElse",
            BinaryOp::LessThan => "LessThan",
            BinaryOp::LessThanOrEqual => "LessThanOrEqual",
            BinaryOp::GreaterThan => "GreaterThan",
            BinaryOp::GreaterThanOrEqual => "GreaterThanOrEqual",
            BinaryOp::Equal => "Equal",
            BinaryOp::NotEqual => "NotEqual",
            BinaryOp::Coalesce => "Coalesce",
            BinaryOp::ArrayIndex => "ArrayIndex",
            BinaryOp::BitShiftLeft => "BitShiftLeft",
            BinaryOp::BitShiftRight => "BitShiftRight",
            BinaryOp::ExclusiveOr => "ExclusiveOr",
        };
        write!(f, "{}", name)
    }
}

/// Unary expression node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Negate,
    Convert,
    ArrayLength,
    Quote,
    TypeAs,
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Not => write!(f, "Not"),
            UnaryOp::Negate => write!(f, "Negate"),
            UnaryOp::Convert => write!(f, "Convert"),
            UnaryOp::ArrayLength => write!(f, "ArrayLength"),
            UnaryOp::Quote => write!(f, "Quote"),
            UnaryOp::TypeAs => write!(f, "TypeAs"),
        }
    }
}
