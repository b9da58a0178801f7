//! Operator semantics over host values.

use chrono::TimeDelta;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use std::cmp::Ordering;

use crate::ast::{BinaryOp, HostType, TimeSpan, UnaryOp, Value};
use crate::error::{EvalError, EvalResult};

/// Numeric view used for promotion: int < decimal < float.
#[derive(Debug, Clone, Copy)]
enum Num {
    I(i64),
    D(Decimal),
    F(f64),
}

fn num_of(v: &Value) -> Option<Num> {
    match v {
        Value::Int(n) => Some(Num::I(*n)),
        Value::Enum { value, .. } => Some(Num::I(*value)),
        Value::Char(c) => Some(Num::I(*c as i64)),
        Value::Decimal(d) => Some(Num::D(*d)),
        Value::Float(f) => Some(Num::F(*f)),
        _ => None,
    }
}

fn to_f64(n: Num) -> f64 {
    match n {
        Num::I(i) => i as f64,
        Num::D(d) => d.to_f64().unwrap_or(f64::NAN),
        Num::F(f) => f,
    }
}

fn to_decimal(n: Num) -> Option<Decimal> {
    match n {
        Num::I(i) => Some(Decimal::from(i)),
        Num::D(d) => Some(d),
        Num::F(f) => Decimal::from_f64(f),
    }
}

fn overflow(op: BinaryOp) -> EvalError {
    EvalError::Overflow(op.to_string())
}

fn arithmetic(op: BinaryOp, a: Num, b: Num) -> EvalResult<Value> {
    match (a, b) {
        (Num::F(_), _) | (_, Num::F(_)) => {
            let (x, y) = (to_f64(a), to_f64(b));
            let r = match op {
                BinaryOp::Add => x + y,
                BinaryOp::Subtract => x - y,
                BinaryOp::Multiply => x * y,
                BinaryOp::Divide => x / y,
                BinaryOp::Modulo => x % y,
                _ => return Err(EvalError::mismatch(format!("{} on floats", op))),
            };
            Ok(Value::Float(r))
        }
        (Num::D(_), _) | (_, Num::D(_)) => {
            let (x, y) = match (to_decimal(a), to_decimal(b)) {
                (Some(x), Some(y)) => (x, y),
                _ => return Err(overflow(op)),
            };
            if matches!(op, BinaryOp::Divide | BinaryOp::Modulo) && y.is_zero() {
                return Err(EvalError::DivideByZero);
            }
            let r = match op {
                BinaryOp::Add => x.checked_add(y),
                BinaryOp::Subtract => x.checked_sub(y),
                BinaryOp::Multiply => x.checked_mul(y),
                BinaryOp::Divide => x.checked_div(y),
                BinaryOp::Modulo => x.checked_rem(y),
                _ => return Err(EvalError::mismatch(format!("{} on decimals", op))),
            };
            r.map(Value::Decimal).ok_or_else(|| overflow(op))
        }
        (Num::I(x), Num::I(y)) => {
            if matches!(op, BinaryOp::Divide | BinaryOp::Modulo) && y == 0 {
                return Err(EvalError::DivideByZero);
            }
            let r = match op {
                BinaryOp::Add => x.checked_add(y),
                BinaryOp::Subtract => x.checked_sub(y),
                BinaryOp::Multiply => x.checked_mul(y),
                BinaryOp::Divide => x.checked_div(y),
                BinaryOp::Modulo => x.checked_rem(y),
                BinaryOp::And => Some(x & y),
                BinaryOp::Or => Some(x | y),
                BinaryOp::ExclusiveOr => Some(x ^ y),
                BinaryOp::BitShiftLeft => Some(x.wrapping_shl((y & 63) as u32)),
                BinaryOp::BitShiftRight => Some(x.wrapping_shr((y & 63) as u32)),
                _ => return Err(EvalError::mismatch(format!("{} on integers", op))),
            };
            r.map(Value::Int).ok_or_else(|| overflow(op))
        }
    }
}

/// Host equality: numbers compare across representations, enums compare by value.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| values_equal(p, q))
        }
        _ => match (num_of(a), num_of(b)) {
            (Some(x), Some(y)) => compare_num(x, y) == Some(Ordering::Equal),
            _ => a == b,
        },
    }
}

fn compare_num(a: Num, b: Num) -> Option<Ordering> {
    match (a, b) {
        (Num::I(x), Num::I(y)) => Some(x.cmp(&y)),
        (Num::F(_), _) | (_, Num::F(_)) => to_f64(a).partial_cmp(&to_f64(b)),
        _ => Some(to_decimal(a)?.cmp(&to_decimal(b)?)),
    }
}

/// Ordering between two values of comparable kinds.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::DateTime(x), Value::DateTime(y)) => Some(x.cmp(y)),
        (Value::TimeSpan(x), Value::TimeSpan(y)) => Some(x.cmp(y)),
        (Value::Guid(x), Value::Guid(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => compare_num(num_of(a)?, num_of(b)?),
    }
}

fn bool_pair(op: BinaryOp, a: &Value, b: &Value) -> Option<EvalResult<Value>> {
    let (x, y) = (a.as_bool()?, b.as_bool()?);
    let r = match op {
        BinaryOp::And | BinaryOp::AndAlso => x && y,
        BinaryOp::Or | BinaryOp::OrElse => x || y,
        BinaryOp::ExclusiveOr => x ^ y,
        BinaryOp::Equal => x == y,
        BinaryOp::NotEqual => x != y,
        _ => return None,
    };
    Some(Ok(Value::Bool(r)))
}

fn concat_part(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Temporal arithmetic (datetime/timespan mixes).
fn temporal(op: BinaryOp, a: &Value, b: &Value) -> Option<EvalResult<Value>> {
    let shift = |dt: &chrono::NaiveDateTime, ts: &TimeSpan, sign: i64| {
        let delta = TimeSpan(ts.ticks().saturating_mul(sign)).to_delta();
        dt.checked_add_signed(delta)
            .map(Value::DateTime)
            .ok_or_else(|| overflow(op))
    };
    match (op, a, b) {
        (BinaryOp::Add, Value::DateTime(dt), Value::TimeSpan(ts)) => Some(shift(dt, ts, 1)),
        (BinaryOp::Add, Value::TimeSpan(ts), Value::DateTime(dt)) => Some(shift(dt, ts, 1)),
        (BinaryOp::Subtract, Value::DateTime(dt), Value::TimeSpan(ts)) => Some(shift(dt, ts, -1)),
        (BinaryOp::Subtract, Value::DateTime(x), Value::DateTime(y)) => {
            let delta: TimeDelta = x.signed_duration_since(*y);
            Some(Ok(Value::TimeSpan(TimeSpan::from(delta))))
        }
        (BinaryOp::Add, Value::TimeSpan(x), Value::TimeSpan(y)) => Some(
            x.ticks()
                .checked_add(y.ticks())
                .map(|t| Value::TimeSpan(TimeSpan(t)))
                .ok_or_else(|| overflow(op)),
        ),
        (BinaryOp::Subtract, Value::TimeSpan(x), Value::TimeSpan(y)) => Some(
            x.ticks()
                .checked_sub(y.ticks())
                .map(|t| Value::TimeSpan(TimeSpan(t)))
                .ok_or_else(|| overflow(op)),
        ),
        _ => None,
    }
}

/// Apply a binary operator to two evaluated operands.
pub fn binary(op: BinaryOp, a: &Value, b: &Value) -> EvalResult<Value> {
    match op {
        BinaryOp::Equal => return Ok(Value::Bool(values_equal(a, b))),
        BinaryOp::NotEqual => return Ok(Value::Bool(!values_equal(a, b))),
        BinaryOp::LessThan
        | BinaryOp::LessThanOrEqual
        | BinaryOp::GreaterThan
        | BinaryOp::GreaterThanOrEqual => {
            // Lifted comparisons against null are false
            if a.is_null() || b.is_null() {
                return Ok(Value::Bool(false));
            }
            let ord = compare(a, b).ok_or_else(|| {
                EvalError::mismatch(format!(
                    "cannot compare {} with {}",
                    a.host_type(),
                    b.host_type()
                ))
            })?;
            let r = match op {
                BinaryOp::LessThan => ord == Ordering::Less,
                BinaryOp::LessThanOrEqual => ord != Ordering::Greater,
                BinaryOp::GreaterThan => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            };
            return Ok(Value::Bool(r));
        }
        BinaryOp::Coalesce => {
            return Ok(if a.is_null() { b.clone() } else { a.clone() });
        }
        BinaryOp::ArrayIndex => {
            let items = a
                .as_list()
                .ok_or_else(|| EvalError::mismatch(format!("cannot index {}", a.host_type())))?;
            let index = b
                .as_i64()
                .ok_or_else(|| EvalError::mismatch("array index must be an integer"))?;
            return usize::try_from(index)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or(EvalError::IndexOutOfRange {
                    index,
                    len: items.len(),
                });
        }
        _ => {}
    }

    if let Some(r) = bool_pair(op, a, b) {
        return r;
    }
    if op == BinaryOp::Add && (matches!(a, Value::String(_)) || matches!(b, Value::String(_))) {
        return Ok(Value::String(format!("{}{}", concat_part(a), concat_part(b))));
    }
    if a.is_null() || b.is_null() {
        return Ok(Value::Null);
    }
    if let Some(r) = temporal(op, a, b) {
        return r;
    }
    match (num_of(a), num_of(b)) {
        (Some(x), Some(y)) => arithmetic(op, x, y),
        _ => Err(EvalError::mismatch(format!(
            "operator {} is not defined for {} and {}",
            op,
            a.host_type(),
            b.host_type()
        ))),
    }
}

/// Apply a unary operator; `ty` is the node's target type.
pub fn unary(op: UnaryOp, v: Value, ty: &HostType) -> EvalResult<Value> {
    match op {
        UnaryOp::Not => match v {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            Value::Int(n) => Ok(Value::Int(!n)),
            Value::Null => Ok(Value::Null),
            other => Err(EvalError::mismatch(format!("Not on {}", other.host_type()))),
        },
        UnaryOp::Negate => match v {
            Value::Int(n) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| EvalError::Overflow("Negate".to_string())),
            Value::Decimal(d) => Ok(Value::Decimal(-d)),
            Value::Float(f) => Ok(Value::Float(-f)),
            Value::TimeSpan(ts) => Ok(Value::TimeSpan(TimeSpan(-ts.ticks()))),
            Value::Null => Ok(Value::Null),
            other => Err(EvalError::mismatch(format!("Negate on {}", other.host_type()))),
        },
        UnaryOp::Convert => convert(v, ty),
        UnaryOp::TypeAs => Ok(convert(v, ty).unwrap_or(Value::Null)),
        UnaryOp::ArrayLength => match v {
            Value::List(items) => Ok(Value::Int(items.len() as i64)),
            other => Err(EvalError::mismatch(format!("ArrayLength on {}", other.host_type()))),
        },
        UnaryOp::Quote => Ok(v),
    }
}

fn wrap_integer(n: i64, ty: &HostType) -> i64 {
    match ty {
        HostType::Int8 => n as i8 as i64,
        HostType::Int16 => n as i16 as i64,
        HostType::Int32 => n as i32 as i64,
        HostType::UInt8 => n as u8 as i64,
        HostType::UInt16 => n as u16 as i64,
        HostType::UInt32 => n as u32 as i64,
        _ => n,
    }
}

/// Host conversion of a value to a target type.
pub fn convert(v: Value, ty: &HostType) -> EvalResult<Value> {
    if v.is_null() {
        return Ok(Value::Null);
    }
    let target = ty.underlying();
    let mismatch = |v: &Value| {
        EvalError::mismatch(format!("cannot convert {} to {}", v.host_type(), target))
    };
    if target.is_integer() {
        let n = match &v {
            Value::Decimal(d) => d
                .trunc()
                .to_i64()
                .ok_or_else(|| EvalError::Overflow("Convert".into()))?,
            Value::Float(f) if f.is_finite() => f.trunc() as i64,
            other => other.as_i64().ok_or_else(|| mismatch(other))?,
        };
        return Ok(Value::Int(wrap_integer(n, target)));
    }
    match target {
        HostType::Float32 => match num_of(&v) {
            Some(n) => Ok(Value::Float(to_f64(n) as f32 as f64)),
            None => Err(mismatch(&v)),
        },
        HostType::Float64 => match num_of(&v) {
            Some(n) => Ok(Value::Float(to_f64(n))),
            None => Err(mismatch(&v)),
        },
        HostType::Decimal => match num_of(&v).and_then(to_decimal) {
            Some(d) => Ok(Value::Decimal(d)),
            None => Err(mismatch(&v)),
        },
        HostType::Char => match &v {
            Value::Char(_) => Ok(v),
            other => other
                .as_i64()
                .and_then(|n| u32::try_from(n).ok())
                .and_then(char::from_u32)
                .map(Value::Char)
                .ok_or_else(|| mismatch(other)),
        },
        HostType::Enum(e) => match v.as_i64() {
            Some(n) => Ok(Value::enum_value(e, n)),
            None => Err(mismatch(&v)),
        },
        HostType::Bool => match v {
            Value::Bool(_) => Ok(v),
            other => Err(mismatch(&other)),
        },
        HostType::String => match v {
            Value::String(_) => Ok(v),
            other => Err(mismatch(&other)),
        },
        HostType::DateTime => match v {
            Value::DateTime(_) => Ok(v),
            other => Err(mismatch(&other)),
        },
        HostType::TimeSpan => match v {
            Value::TimeSpan(_) => Ok(v),
            other => Err(mismatch(&other)),
        },
        HostType::Guid => match v {
            Value::Guid(_) => Ok(v),
            other => Err(mismatch(&other)),
        },
        // Reference conversions (boxing, upcasts) keep the value
        _ => Ok(v),
    }
}
