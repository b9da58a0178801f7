use serde::{Deserialize, Serialize};

use super::operators::{BinaryOp, UnaryOp};
use super::types::HostType;
use super::values::Value;

/// A declared lambda parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    pub ty: HostType,
}

/// An expression tree node, as produced by the query builder from a host lambda.
///
/// Nodes are immutable once built; the compiler only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Lambda {
        parameters: Vec<ParamDecl>,
        body: Box<Expression>,
    },
    /// `target.member`; a `None` target is a static member of `declaring_type`.
    MemberAccess {
        target: Option<Box<Expression>>,
        member: String,
        declaring_type: Option<String>,
        member_type: HostType,
    },
    Constant {
        value: Value,
        ty: HostType,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `method` names an attached user-defined conversion for `Convert`.
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
        ty: HostType,
        method: Option<String>,
    },
    Parameter {
        name: String,
        ty: HostType,
    },
    /// `target.method(arguments)`; a `None` target is a static call on `owner_type`.
    MethodCall {
        target: Option<Box<Expression>>,
        method: String,
        arguments: Vec<Expression>,
        owner_type: HostType,
        ty: HostType,
    },
    /// Constructor call. `members` names the properties of anonymous types, positionally.
    New {
        ty: HostType,
        arguments: Vec<Expression>,
        members: Vec<String>,
    },
    NewArray {
        element_type: HostType,
        elements: Vec<Expression>,
    },
    MemberInit {
        ty: HostType,
        bindings: Vec<(String, Expression)>,
    },
}

impl Expression {
    pub fn lambda<S: Into<String>>(
        parameters: impl IntoIterator<Item = (S, HostType)>,
        body: Expression,
    ) -> Self {
        Expression::Lambda {
            parameters: parameters
                .into_iter()
                .map(|(name, ty)| ParamDecl {
                    name: name.into(),
                    ty,
                })
                .collect(),
            body: Box::new(body),
        }
    }

    pub fn param(name: impl Into<String>, ty: HostType) -> Self {
        Expression::Parameter {
            name: name.into(),
            ty,
        }
    }

    /// Instance member access; the declaring type is taken from the target's static type.
    pub fn member(target: Expression, member: impl Into<String>, member_type: HostType) -> Self {
        let declaring_type = target.static_type().entity_name().map(str::to_string);
        Expression::MemberAccess {
            target: Some(Box::new(target)),
            member: member.into(),
            declaring_type,
            member_type,
        }
    }

    pub fn static_member(
        declaring_type: impl Into<String>,
        member: impl Into<String>,
        member_type: HostType,
    ) -> Self {
        Expression::MemberAccess {
            target: None,
            member: member.into(),
            declaring_type: Some(declaring_type.into()),
            member_type,
        }
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        let value = value.into();
        let ty = value.host_type();
        Expression::Constant { value, ty }
    }

    pub fn typed_constant(value: impl Into<Value>, ty: HostType) -> Self {
        Expression::Constant {
            value: value.into(),
            ty,
        }
    }

    pub fn null() -> Self {
        Expression::Constant {
            value: Value::Null,
            ty: HostType::Null,
        }
    }

    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOp::Equal, left, right)
    }

    pub fn ne(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOp::NotEqual, left, right)
    }

    pub fn gt(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOp::GreaterThan, left, right)
    }

    pub fn lt(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOp::LessThan, left, right)
    }

    pub fn and_also(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOp::AndAlso, left, right)
    }

    pub fn or_else(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOp::OrElse, left, right)
    }

    pub fn unary(op: UnaryOp, operand: Expression, ty: HostType) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
            ty,
            method: None,
        }
    }

    pub fn not(operand: Expression) -> Self {
        Self::unary(UnaryOp::Not, operand, HostType::Bool)
    }

    pub fn negate(operand: Expression) -> Self {
        let ty = operand.static_type();
        Self::unary(UnaryOp::Negate, operand, ty)
    }

    pub fn convert(operand: Expression, ty: HostType) -> Self {
        Self::unary(UnaryOp::Convert, operand, ty)
    }

    /// `Convert` backed by a user-defined conversion method.
    pub fn convert_with(operand: Expression, ty: HostType, method: impl Into<String>) -> Self {
        Expression::Unary {
            op: UnaryOp::Convert,
            operand: Box::new(operand),
            ty,
            method: Some(method.into()),
        }
    }

    pub fn call(
        target: Expression,
        method: impl Into<String>,
        arguments: Vec<Expression>,
        ty: HostType,
    ) -> Self {
        let owner_type = target.static_type();
        Expression::MethodCall {
            target: Some(Box::new(target)),
            method: method.into(),
            arguments,
            owner_type,
            ty,
        }
    }

    pub fn static_call(
        owner_type: HostType,
        method: impl Into<String>,
        arguments: Vec<Expression>,
        ty: HostType,
    ) -> Self {
        Expression::MethodCall {
            target: None,
            method: method.into(),
            arguments,
            owner_type,
            ty,
        }
    }

    pub fn new_object<S: Into<String>>(
        ty: HostType,
        members: impl IntoIterator<Item = S>,
        arguments: Vec<Expression>,
    ) -> Self {
        Expression::New {
            ty,
            arguments,
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn new_array(element_type: HostType, elements: Vec<Expression>) -> Self {
        Expression::NewArray {
            element_type,
            elements,
        }
    }

    pub fn member_init<S: Into<String>>(
        ty: HostType,
        bindings: impl IntoIterator<Item = (S, Expression)>,
    ) -> Self {
        Expression::MemberInit {
            ty,
            bindings: bindings.into_iter().map(|(m, e)| (m.into(), e)).collect(),
        }
    }

    /// Best-known static type of the node.
    pub fn static_type(&self) -> HostType {
        match self {
            Expression::Lambda { body, .. } => body.static_type(),
            Expression::MemberAccess { member_type, .. } => member_type.clone(),
            Expression::Constant { ty, .. } => ty.clone(),
            Expression::Binary { op, left, right } => match op {
                op if op.is_comparison() || op.is_logical() => HostType::Bool,
                BinaryOp::Coalesce => right.static_type(),
                BinaryOp::ArrayIndex => left
                    .static_type()
                    .element_type()
                    .cloned()
                    .unwrap_or(HostType::Null),
                _ => left.static_type(),
            },
            Expression::Unary { op, operand, ty, .. } => match op {
                UnaryOp::Convert | UnaryOp::TypeAs => ty.clone(),
                UnaryOp::ArrayLength => HostType::Int32,
                UnaryOp::Not | UnaryOp::Negate | UnaryOp::Quote => operand.static_type(),
            },
            Expression::Parameter { ty, .. } => ty.clone(),
            Expression::MethodCall { ty, .. } => ty.clone(),
            Expression::New { ty, .. } | Expression::MemberInit { ty, .. } => ty.clone(),
            Expression::NewArray { element_type, .. } => HostType::array_of(element_type.clone()),
        }
    }

    /// Short node-kind name, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Expression::Lambda { .. } => "Lambda",
            Expression::MemberAccess { .. } => "MemberAccess",
            Expression::Constant { .. } => "Constant",
            Expression::Binary { .. } => "Binary",
            Expression::Unary { .. } => "Unary",
            Expression::Parameter { .. } => "Parameter",
            Expression::MethodCall { .. } => "MethodCall",
            Expression::New { .. } => "New",
            Expression::NewArray { .. } => "NewArray",
            Expression::MemberInit { .. } => "MemberInit",
        }
    }
}

fn write_list(f: &mut std::fmt::Formatter<'_>, items: &[Expression]) -> std::fmt::Result {
    for (i, e) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", e)?;
    }
    Ok(())
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Lambda { parameters, body } => {
                if parameters.len() == 1 {
                    write!(f, "{} => {}", parameters[0].name, body)
                } else {
                    let names: Vec<&str> = parameters.iter().map(|p| p.name.as_str()).collect();
                    write!(f, "({}) => {}", names.join(", "), body)
                }
            }
            Expression::MemberAccess {
                target,
                member,
                declaring_type,
                ..
            } => match target {
                Some(t) => write!(f, "{}.{}", t, member),
                None => write!(f, "{}.{}", declaring_type.as_deref().unwrap_or("?"), member),
            },
            Expression::Constant { value, .. } => match value {
                Value::String(s) => write!(f, "\"{}\"", s),
                Value::Char(c) => write!(f, "'{}'", c),
                v => write!(f, "{}", v),
            },
            Expression::Binary { op, left, right } => match op {
                BinaryOp::ArrayIndex => write!(f, "{}[{}]", left, right),
                op => write!(f, "({} {} {})", left, op.symbol(), right),
            },
            Expression::Unary { op, operand, ty, .. } => match op {
                UnaryOp::Not => write!(f, "Not({})", operand),
                UnaryOp::Negate => write!(f, "-{}", operand),
                UnaryOp::Convert => write!(f, "Convert({}, {})", operand, ty),
                UnaryOp::ArrayLength => write!(f, "ArrayLength({})", operand),
                UnaryOp::Quote => write!(f, "{}", operand),
                UnaryOp::TypeAs => write!(f, "({} As {})", operand, ty),
            },
            Expression::Parameter { name, .. } => write!(f, "{}", name),
            Expression::MethodCall {
                target,
                method,
                arguments,
                owner_type,
                ..
            } => {
                match target {
                    Some(t) => write!(f, "{}.{}(", t, method)?,
                    None => write!(f, "{}.{}(", owner_type, method)?,
                }
                write_list(f, arguments)?;
                write!(f, ")")
            }
            Expression::New { ty, arguments, .. } => {
                write!(f, "new {}(", ty)?;
                write_list(f, arguments)?;
                write!(f, ")")
            }
            Expression::NewArray {
                element_type,
                elements,
            } => {
                write!(f, "new {}[] {{", element_type)?;
                write_list(f, elements)?;
                write!(f, "}}")
            }
            Expression::MemberInit { ty, bindings } => {
                write!(f, "new {} {{", ty)?;
                for (i, (m, e)) in bindings.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", m, e)?;
                }
                write!(f, "}}")
            }
        }
    }
}
