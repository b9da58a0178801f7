//! Native evaluation of constant sub-expressions.
//!
//! The compiler folds any sub-tree that does not touch the query parameter into a
//! host [`Value`]. Evaluation is a small interpreter over literals, operators,
//! member reads and a fixed set of built-in methods. Anything that needs real host
//! code (user functions, captured services) goes through a [`HostEnvironment`]
//! supplied by the caller.

pub mod arith;
pub mod methods;

use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::{BinaryOp, Expression, HostType, Record, UnaryOp, Value};
use crate::error::{EvalError, EvalResult};

/// Default nesting limit for evaluation.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Capabilities the caller injects for host computations the interpreter cannot do itself.
///
/// Every hook returns `None` when it does not recognize the request.
pub trait HostEnvironment: Send + Sync {
    fn static_member(&self, declaring: &str, member: &str) -> Option<EvalResult<Value>> {
        let _ = (declaring, member);
        None
    }

    fn call_method(
        &self,
        owner: &HostType,
        target: Option<&Value>,
        method: &str,
        args: &[Value],
    ) -> Option<EvalResult<Value>> {
        let _ = (owner, target, method, args);
        None
    }

    fn construct(&self, ty: &HostType, args: &[Value]) -> Option<EvalResult<Value>> {
        let _ = (ty, args);
        None
    }
}

/// Environment with no host capabilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHost;

impl HostEnvironment for NoHost {}

/// Host function registered on [`Captures`]: `(receiver, arguments) -> value`.
pub type HostFn = Arc<dyn Fn(Option<&Value>, &[Value]) -> EvalResult<Value> + Send + Sync>;

/// Map-backed environment: static members and functions registered by
/// `"Owner.Name"` keys.
#[derive(Clone, Default)]
pub struct Captures {
    statics: HashMap<String, Value>,
    functions: HashMap<String, HostFn>,
}

impl Captures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_static(
        mut self,
        declaring: impl AsRef<str>,
        member: impl AsRef<str>,
        value: impl Into<Value>,
    ) -> Self {
        self.statics.insert(
            format!("{}.{}", declaring.as_ref(), member.as_ref()),
            value.into(),
        );
        self
    }

    /// Register a function for calls of `method` on `owner` (static or instance).
    pub fn with_function<F>(mut self, owner: impl AsRef<str>, method: impl AsRef<str>, f: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        self.functions.insert(
            format!("{}.{}", owner.as_ref(), method.as_ref()),
            Arc::new(f),
        );
        self
    }
}

impl std::fmt::Debug for Captures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut functions: Vec<&String> = self.functions.keys().collect();
        functions.sort();
        f.debug_struct("Captures")
            .field("statics", &self.statics)
            .field("functions", &functions)
            .finish()
    }
}

impl HostEnvironment for Captures {
    fn static_member(&self, declaring: &str, member: &str) -> Option<EvalResult<Value>> {
        self.statics
            .get(&format!("{}.{}", declaring, member))
            .cloned()
            .map(Ok)
    }

    fn call_method(
        &self,
        owner: &HostType,
        target: Option<&Value>,
        method: &str,
        args: &[Value],
    ) -> Option<EvalResult<Value>> {
        let f = self.functions.get(&format!("{}.{}", owner, method))?;
        Some(f(target, args))
    }

    fn construct(&self, ty: &HostType, args: &[Value]) -> Option<EvalResult<Value>> {
        let f = self.functions.get(&format!("{}.new", ty))?;
        Some(f(None, args))
    }
}

/// Tree-walking interpreter for parameter-free sub-expressions.
pub struct Evaluator<'a> {
    env: &'a dyn HostEnvironment,
    max_depth: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(env: &'a dyn HostEnvironment) -> Self {
        Self {
            env,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn evaluate(&self, expr: &Expression) -> EvalResult<Value> {
        self.eval(expr, 0)
    }

    fn eval(&self, expr: &Expression, depth: usize) -> EvalResult<Value> {
        if depth > self.max_depth {
            return Err(EvalError::DepthExceeded {
                limit: self.max_depth,
            });
        }
        let depth = depth + 1;
        match expr {
            Expression::Lambda { parameters, body } => {
                if parameters.is_empty() {
                    self.eval(body, depth)
                } else {
                    Err(EvalError::InvalidOperation(format!(
                        "lambda '{}' cannot be evaluated as a value",
                        expr
                    )))
                }
            }
            Expression::Constant { value, ty } => Ok(tag_enum(value.clone(), ty)),
            Expression::Parameter { name, .. } => Err(EvalError::InvalidOperation(format!(
                "parameter '{}' has no value outside a query",
                name
            ))),
            Expression::MemberAccess {
                target,
                member,
                declaring_type,
                member_type,
            } => {
                let value = match target {
                    Some(t) => {
                        let owner = self.eval(t, depth)?;
                        methods::member(&owner, member)?
                    }
                    None => self.static_member(declaring_type.as_deref(), member, member_type)?,
                };
                Ok(tag_enum(value, member_type))
            }
            Expression::Binary { op, left, right } => self.eval_binary(*op, left, right, depth),
            Expression::Unary {
                op,
                operand,
                ty,
                method,
            } => {
                let v = self.eval(operand, depth)?;
                if let (UnaryOp::Convert, Some(m)) = (op, method) {
                    if let Some(r) = self.env.call_method(ty, None, m, std::slice::from_ref(&v)) {
                        return r;
                    }
                }
                arith::unary(*op, v, ty)
            }
            Expression::MethodCall {
                target,
                method,
                arguments,
                owner_type,
                ty,
            } => {
                let receiver = match target {
                    Some(t) => Some(self.eval(t, depth)?),
                    None => None,
                };
                let args = self.eval_all(arguments, depth)?;
                let result = methods::call(owner_type, receiver.as_ref(), method, &args)
                    .or_else(|| {
                        self.env
                            .call_method(owner_type, receiver.as_ref(), method, &args)
                    })
                    .unwrap_or_else(|| {
                        Err(EvalError::UnknownMethod {
                            owner: owner_type.to_string(),
                            method: method.clone(),
                        })
                    })?;
                Ok(tag_enum(result, ty))
            }
            Expression::New {
                ty,
                arguments,
                members,
            } => {
                let args = self.eval_all(arguments, depth)?;
                if let Some(r) = self.env.construct(ty, &args) {
                    return r;
                }
                methods::construct(ty, members, &args).unwrap_or_else(|| {
                    Err(EvalError::UnknownMethod {
                        owner: ty.to_string(),
                        method: ".ctor".to_string(),
                    })
                })
            }
            Expression::NewArray { elements, .. } => {
                self.eval_all(elements, depth).map(Value::List)
            }
            Expression::MemberInit { ty, bindings } => {
                let mut record = Record::new(ty.to_string());
                for (member, e) in bindings {
                    record.fields.push((member.clone(), self.eval(e, depth)?));
                }
                Ok(Value::Object(record))
            }
        }
    }

    fn eval_all(&self, exprs: &[Expression], depth: usize) -> EvalResult<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e, depth)).collect()
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
        depth: usize,
    ) -> EvalResult<Value> {
        let l = self.eval(left, depth)?;
        match (op, &l) {
            (BinaryOp::AndAlso, Value::Bool(false)) => return Ok(Value::Bool(false)),
            (BinaryOp::OrElse, Value::Bool(true)) => return Ok(Value::Bool(true)),
            (BinaryOp::Coalesce, v) if !v.is_null() => return Ok(l),
            _ => {}
        }
        let r = self.eval(right, depth)?;
        match op {
            BinaryOp::AndAlso | BinaryOp::OrElse => match (l.as_bool(), r.as_bool()) {
                (Some(_), Some(b)) => Ok(Value::Bool(b)),
                _ => Err(EvalError::mismatch(format!(
                    "{} requires boolean operands, got {} and {}",
                    op,
                    l.host_type(),
                    r.host_type()
                ))),
            },
            _ => arith::binary(op, &l, &r),
        }
    }

    fn static_member(
        &self,
        declaring: Option<&str>,
        member: &str,
        member_type: &HostType,
    ) -> EvalResult<Value> {
        let declaring = declaring.unwrap_or_default();
        if let Some(v) = methods::static_member(declaring, member, member_type) {
            return Ok(v);
        }
        self.env
            .static_member(declaring, member)
            .unwrap_or_else(|| {
                Err(EvalError::UnknownMember {
                    owner: declaring.to_string(),
                    member: member.to_string(),
                })
            })
    }
}

/// Integers read through an enum-typed node become enum values.
fn tag_enum(value: Value, ty: &HostType) -> Value {
    match (ty.underlying().as_enum(), &value) {
        (Some(e), Value::Int(n)) => Value::enum_value(e, *n),
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::EnumType;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn eval(e: &Expression) -> EvalResult<Value> {
        Evaluator::new(&NoHost).evaluate(e)
    }

    #[test]
    fn test_arithmetic_folds() {
        let e = Expression::eq(
            Expression::binary(BinaryOp::Add, Expression::constant(5), Expression::constant(3)),
            Expression::constant(8),
        );
        assert_eq!(eval(&e).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_parameter_is_invalid_operation() {
        let order = HostType::entity("Orders");
        let e = Expression::member(Expression::param("o", order), "Freight", HostType::Decimal);
        assert!(eval(&e).unwrap_err().is_invalid_operation());
    }

    #[test]
    fn test_captured_record_member() {
        let closure = Record::new("<>c__DisplayClass").with("limit", Decimal::new(125, 1));
        let e = Expression::member(
            Expression::typed_constant(closure, HostType::object("<>c__DisplayClass")),
            "limit",
            HostType::Decimal,
        );
        assert_eq!(eval(&e).unwrap(), Value::Decimal(Decimal::new(125, 1)));
    }

    #[test]
    fn test_short_circuit_skips_right_side() {
        let failing = Expression::param("o", HostType::entity("Orders"));
        let e = Expression::and_also(Expression::constant(false), failing);
        assert_eq!(eval(&e).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_datetime_construction_and_member() {
        let e = Expression::member(
            Expression::new_object(
                HostType::DateTime,
                Vec::<String>::new(),
                vec![Expression::constant(1997), Expression::constant(7), Expression::constant(4)],
            ),
            "Year",
            HostType::Int32,
        );
        assert_eq!(eval(&e).unwrap(), Value::Int(1997));
        let d = NaiveDate::from_ymd_opt(1997, 7, 4).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let e = Expression::call(
            Expression::constant(d),
            "AddDays",
            vec![Expression::constant(1)],
            HostType::DateTime,
        );
        assert_eq!(eval(&e).unwrap().to_string(), "1997-07-05 00:00:00");
    }

    #[test]
    fn test_unknown_method_without_host() {
        let e = Expression::static_call(
            HostType::object("Pricing"),
            "Discount",
            vec![],
            HostType::Decimal,
        );
        assert!(matches!(eval(&e), Err(EvalError::UnknownMethod { .. })));
    }

    #[test]
    fn test_captures_provide_host_functions() {
        let env = Captures::new()
            .with_static("Settings", "MinFreight", 10)
            .with_function("Pricing", "Discount", |_, args| {
                Ok(Value::Int(args.first().and_then(Value::as_i64).unwrap_or(0) / 2))
            });
        let ev = Evaluator::new(&env);
        let e = Expression::static_call(
            HostType::object("Pricing"),
            "Discount",
            vec![Expression::static_member("Settings", "MinFreight", HostType::Int32)],
            HostType::Int32,
        );
        assert_eq!(ev.evaluate(&e).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_enum_typed_constant_is_tagged() {
        let race = HostType::enumeration(EnumType::new("Race").member("Elf", 1));
        let v = eval(&Expression::typed_constant(1, race)).unwrap();
        assert_eq!(v.to_string(), "Elf");
    }

    #[test]
    fn test_depth_limit() {
        let mut e = Expression::constant(1);
        for _ in 0..10 {
            e = Expression::negate(e);
        }
        let ev = Evaluator::new(&NoHost).with_max_depth(4);
        assert!(matches!(
            ev.evaluate(&e),
            Err(EvalError::DepthExceeded { limit: 4 })
        ));
    }
}
