//! Built-in members, methods and constructors of common host types.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use uuid::Uuid;

use super::arith::{compare, convert, values_equal};
use crate::ast::{HostType, Record, TICKS_PER_MILLISECOND, TICKS_PER_SECOND, TimeSpan, Value};
use crate::error::{EvalError, EvalResult};

fn unknown_member(owner: &Value, member: &str) -> EvalError {
    EvalError::UnknownMember {
        owner: owner.host_type().to_string(),
        member: member.to_string(),
    }
}

fn int_arg(args: &[Value], i: usize, method: &str) -> EvalResult<i64> {
    args.get(i)
        .and_then(Value::as_i64)
        .ok_or_else(|| {
            EvalError::InvalidArgument(format!("{} expects an integer argument {}", method, i))
        })
}

fn float_arg(args: &[Value], i: usize, method: &str) -> EvalResult<f64> {
    args.get(i)
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            EvalError::InvalidArgument(format!("{} expects a numeric argument {}", method, i))
        })
}

fn str_arg<'a>(args: &'a [Value], i: usize, method: &str) -> EvalResult<&'a str> {
    args.get(i)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            EvalError::InvalidArgument(format!("{} expects a string argument {}", method, i))
        })
}

/// Instance member of an evaluated value (property read).
pub fn member(target: &Value, name: &str) -> EvalResult<Value> {
    match (target, name) {
        (Value::Null, "HasValue") => return Ok(Value::Bool(false)),
        (Value::Null, "Value") => {
            return Err(EvalError::InvalidOperation(
                "Nullable object must have a value".to_string(),
            ));
        }
        (Value::Null, _) => return Err(EvalError::NullReference(format!("reading '{}'", name))),
        (Value::Object(_), _) => {}
        (_, "HasValue") => return Ok(Value::Bool(true)),
        (v, "Value") => return Ok(v.clone()),
        _ => {}
    }
    match target {
        Value::Object(record) => record
            .get(name)
            .cloned()
            .ok_or_else(|| unknown_member(target, name)),
        Value::String(s) if name == "Length" => Ok(Value::Int(s.chars().count() as i64)),
        Value::List(items) if name == "Count" || name == "Length" => {
            Ok(Value::Int(items.len() as i64))
        }
        Value::DateTime(dt) => Ok(match name {
            "Year" => Value::Int(dt.year() as i64),
            "Month" => Value::Int(dt.month() as i64),
            "Day" => Value::Int(dt.day() as i64),
            "Hour" => Value::Int(dt.hour() as i64),
            "Minute" => Value::Int(dt.minute() as i64),
            "Second" => Value::Int(dt.second() as i64),
            "Millisecond" => Value::Int((dt.nanosecond() / 1_000_000) as i64),
            "DayOfYear" => Value::Int(dt.ordinal() as i64),
            "Date" => Value::DateTime(dt.date().and_time(chrono::NaiveTime::MIN)),
            _ => return Err(unknown_member(target, name)),
        }),
        Value::TimeSpan(ts) => {
            let ticks = ts.ticks();
            let secs = ts.total_seconds();
            Ok(match name {
                "Ticks" => Value::Int(ticks),
                "Days" => Value::Int(ticks / (TICKS_PER_SECOND * 86_400)),
                "Hours" => Value::Int((ticks / (TICKS_PER_SECOND * 3_600)) % 24),
                "Minutes" => Value::Int((ticks / (TICKS_PER_SECOND * 60)) % 60),
                "Seconds" => Value::Int((ticks / TICKS_PER_SECOND) % 60),
                "TotalDays" => Value::Float(secs / 86_400.0),
                "TotalHours" => Value::Float(secs / 3_600.0),
                "TotalMinutes" => Value::Float(secs / 60.0),
                "TotalSeconds" => Value::Float(secs),
                "TotalMilliseconds" => Value::Float(ticks as f64 / TICKS_PER_MILLISECOND as f64),
                _ => return Err(unknown_member(target, name)),
            })
        }
        _ => Err(unknown_member(target, name)),
    }
}

/// Built-in static members. `None` when the member is not built in.
pub fn static_member(declaring: &str, name: &str, ty: &HostType) -> Option<Value> {
    if let Some(e) = ty.as_enum() {
        if e.name == declaring {
            return e.value_of(name).map(|v| Value::enum_value(e, v));
        }
    }
    let v = match (declaring, name) {
        ("String", "Empty") => Value::String(String::new()),
        ("Guid", "Empty") => Value::Guid(Uuid::nil()),
        ("DateTime", "MinValue") => Value::DateTime(NaiveDateTime::MIN),
        ("DateTime", "MaxValue") => Value::DateTime(NaiveDateTime::MAX),
        ("TimeSpan", "Zero") => Value::TimeSpan(TimeSpan(0)),
        ("Int32", "MaxValue") => Value::Int(i32::MAX as i64),
        ("Int32", "MinValue") => Value::Int(i32::MIN as i64),
        ("Int64", "MaxValue") => Value::Int(i64::MAX),
        ("Int64", "MinValue") => Value::Int(i64::MIN),
        ("Decimal", "Zero") => Value::Decimal(Decimal::ZERO),
        ("Math", "PI") => Value::Float(std::f64::consts::PI),
        _ => return None,
    };
    Some(v)
}

fn char_substring(s: &str, start: i64, len: Option<i64>) -> EvalResult<String> {
    let count = s.chars().count();
    let out_of_range = |index: i64| EvalError::IndexOutOfRange { index, len: count };
    let start_u = usize::try_from(start).map_err(|_| out_of_range(start))?;
    if start_u > count {
        return Err(out_of_range(start));
    }
    let take = match len {
        Some(l) => {
            let l_u = usize::try_from(l).map_err(|_| out_of_range(l))?;
            if start_u + l_u > count {
                return Err(out_of_range(start + l));
            }
            l_u
        }
        None => count - start_u,
    };
    Ok(s.chars().skip(start_u).take(take).collect())
}

fn string_method(s: &str, method: &str, args: &[Value]) -> Option<EvalResult<Value>> {
    let r = match method {
        "ToUpper" | "ToUpperInvariant" => Ok(Value::String(s.to_uppercase())),
        "ToLower" | "ToLowerInvariant" => Ok(Value::String(s.to_lowercase())),
        "Trim" => Ok(Value::String(s.trim().to_string())),
        "TrimStart" => Ok(Value::String(s.trim_start().to_string())),
        "TrimEnd" => Ok(Value::String(s.trim_end().to_string())),
        "Substring" => int_arg(args, 0, method).and_then(|start| {
            let len = match args.get(1) {
                Some(_) => Some(int_arg(args, 1, method)?),
                None => None,
            };
            char_substring(s, start, len).map(Value::String)
        }),
        "StartsWith" => str_arg(args, 0, method).map(|p| Value::Bool(s.starts_with(p))),
        "EndsWith" => str_arg(args, 0, method).map(|p| Value::Bool(s.ends_with(p))),
        "Contains" => str_arg(args, 0, method).map(|p| Value::Bool(s.contains(p))),
        "IndexOf" => str_arg(args, 0, method).map(|p| {
            Value::Int(
                s.find(p)
                    .map(|byte| s[..byte].chars().count() as i64)
                    .unwrap_or(-1),
            )
        }),
        "Replace" => str_arg(args, 0, method).and_then(|from| {
            let to = str_arg(args, 1, method)?;
            Ok(Value::String(s.replace(from, to)))
        }),
        _ => return None,
    };
    Some(r)
}

fn datetime_method(dt: &NaiveDateTime, method: &str, args: &[Value]) -> Option<EvalResult<Value>> {
    let overflow = || EvalError::Overflow(method.to_string());
    let add_ms = |ms: f64| -> EvalResult<Value> {
        let delta = TimeDelta::try_milliseconds(ms.round() as i64).ok_or_else(overflow)?;
        dt.checked_add_signed(delta).map(Value::DateTime).ok_or_else(overflow)
    };
    let r = match method {
        "AddDays" => float_arg(args, 0, method).and_then(|n| add_ms(n * 86_400_000.0)),
        "AddHours" => float_arg(args, 0, method).and_then(|n| add_ms(n * 3_600_000.0)),
        "AddMinutes" => float_arg(args, 0, method).and_then(|n| add_ms(n * 60_000.0)),
        "AddSeconds" => float_arg(args, 0, method).and_then(|n| add_ms(n * 1_000.0)),
        "AddMilliseconds" => float_arg(args, 0, method).and_then(add_ms),
        "AddMonths" | "AddYears" => int_arg(args, 0, method).and_then(|n| {
            let months = if method == "AddYears" { n * 12 } else { n };
            let shifted = if months >= 0 {
                dt.checked_add_months(Months::new(months as u32))
            } else {
                dt.checked_sub_months(Months::new(months.unsigned_abs() as u32))
            };
            shifted.map(Value::DateTime).ok_or_else(overflow)
        }),
        _ => return None,
    };
    Some(r)
}

fn instance_method(target: &Value, method: &str, args: &[Value]) -> Option<EvalResult<Value>> {
    match (method, args) {
        ("ToString", []) => return Some(Ok(Value::String(target.to_string()))),
        ("Equals", [other]) => return Some(Ok(Value::Bool(values_equal(target, other)))),
        ("CompareTo", [other]) => {
            return Some(
                compare(target, other)
                    .map(|o| {
                        Value::Int(match o {
                            Ordering::Less => -1,
                            Ordering::Equal => 0,
                            Ordering::Greater => 1,
                        })
                    })
                    .ok_or_else(|| EvalError::mismatch("values are not comparable")),
            );
        }
        ("GetValueOrDefault", [_]) => return Some(Ok(target.clone())),
        _ => {}
    }
    match target {
        Value::String(s) => string_method(s, method, args),
        Value::DateTime(dt) => datetime_method(dt, method, args),
        Value::List(items) => match (method, args) {
            ("Contains", [probe]) => {
                Some(Ok(Value::Bool(items.iter().any(|v| values_equal(v, probe)))))
            }
            ("IndexOf", [probe]) => Some(Ok(Value::Int(
                items
                    .iter()
                    .position(|v| values_equal(v, probe))
                    .map(|i| i as i64)
                    .unwrap_or(-1),
            ))),
            ("Count", []) => Some(Ok(Value::Int(items.len() as i64))),
            _ => None,
        },
        _ => None,
    }
}

fn decimal_or_float(
    v: &Value,
    d: impl Fn(Decimal) -> Decimal,
    f: impl Fn(f64) -> f64,
) -> EvalResult<Value> {
    match v {
        Value::Decimal(x) => Ok(Value::Decimal(d(*x))),
        Value::Int(n) => Ok(Value::Int(*n)),
        other => other
            .as_f64()
            .map(|x| Value::Float(f(x)))
            .ok_or_else(|| {
                EvalError::mismatch(format!("expected a number, got {}", other.host_type()))
            }),
    }
}

fn ticks_from(unit_ticks: f64, args: &[Value], method: &str) -> EvalResult<Value> {
    let n = float_arg(args, 0, method)?;
    Ok(Value::TimeSpan(TimeSpan((n * unit_ticks).round() as i64)))
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
}

fn static_method(owner: &str, method: &str, args: &[Value]) -> Option<EvalResult<Value>> {
    let invalid =
        |what: &str| EvalError::InvalidArgument(format!("{}.{}: {}", owner, method, what));
    let r = match (owner, method, args) {
        ("String", "IsNullOrEmpty", [v]) => Ok(Value::Bool(match v {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        })),
        ("String", "IsNullOrWhiteSpace", [v]) => Ok(Value::Bool(match v {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        })),
        ("String", "Concat", parts) => Ok(Value::String(
            parts
                .iter()
                .map(|p| if p.is_null() { String::new() } else { p.to_string() })
                .collect(),
        )),
        ("String", "Join", [sep, Value::List(items)]) => {
            let sep = sep.to_string();
            Ok(Value::String(
                items.iter().map(Value::to_string).collect::<Vec<_>>().join(&sep),
            ))
        }
        ("Math", "Abs", [v]) => decimal_or_float(v, |d| d.abs(), f64::abs).map(|r| match (v, r) {
            (Value::Int(n), _) => Value::Int(n.abs()),
            (_, r) => r,
        }),
        ("Math", "Floor", [v]) => decimal_or_float(v, |d| d.floor(), f64::floor),
        ("Math", "Ceiling", [v]) => decimal_or_float(v, |d| d.ceil(), f64::ceil),
        ("Math", "Round", [v]) => decimal_or_float(v, |d| d.round(), f64::round_ties_even),
        ("Math", "Round", [v, digits]) => match digits.as_i64() {
            Some(dp) if dp >= 0 => decimal_or_float(
                v,
                |d| d.round_dp(dp as u32),
                |f| {
                    let scale = 10f64.powi(dp as i32);
                    (f * scale).round_ties_even() / scale
                },
            ),
            _ => Err(invalid("digits must be a non-negative integer")),
        },
        ("Math", "Max" | "Min", [a, b]) => match compare(a, b) {
            Some(o) => {
                let pick_a = (method == "Max") == (o != Ordering::Less);
                Ok(if pick_a { a.clone() } else { b.clone() })
            }
            None => Err(invalid("arguments are not comparable")),
        },
        ("Enumerable", "Contains", [Value::List(items), probe]) => {
            Ok(Value::Bool(items.iter().any(|v| values_equal(v, probe))))
        }
        ("Enumerable", "Count", [Value::List(items)]) => Ok(Value::Int(items.len() as i64)),
        ("Enumerable", "Any", [Value::List(items)]) => Ok(Value::Bool(!items.is_empty())),
        ("Guid", "NewGuid", []) => Ok(Value::Guid(Uuid::new_v4())),
        ("Guid", "Parse", [Value::String(s)]) => Uuid::parse_str(s)
            .map(Value::Guid)
            .map_err(|e| invalid(&e.to_string())),
        ("DateTime", "Parse", [Value::String(s)]) => parse_datetime(s)
            .map(Value::DateTime)
            .ok_or_else(|| invalid("unrecognized date/time")),
        ("Int32" | "Int64", "Parse", [Value::String(s)]) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| invalid(&e.to_string())),
        ("Decimal", "Parse", [Value::String(s)]) => s
            .trim()
            .parse::<Decimal>()
            .map(Value::Decimal)
            .map_err(|e| invalid(&e.to_string())),
        ("Double", "Parse", [Value::String(s)]) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| invalid(&e.to_string())),
        ("TimeSpan", "FromTicks", [v]) => v
            .as_i64()
            .map(|t| Value::TimeSpan(TimeSpan(t)))
            .ok_or_else(|| invalid("ticks must be an integer")),
        ("TimeSpan", "FromMilliseconds", _) => {
            ticks_from(TICKS_PER_MILLISECOND as f64, args, method)
        }
        ("TimeSpan", "FromSeconds", _) => ticks_from(TICKS_PER_SECOND as f64, args, method),
        ("TimeSpan", "FromMinutes", _) => ticks_from(TICKS_PER_SECOND as f64 * 60.0, args, method),
        ("TimeSpan", "FromHours", _) => ticks_from(TICKS_PER_SECOND as f64 * 3_600.0, args, method),
        ("TimeSpan", "FromDays", _) => ticks_from(TICKS_PER_SECOND as f64 * 86_400.0, args, method),
        ("Convert", name, [v]) => {
            let ty = match name {
                "ToInt16" => HostType::Int16,
                "ToInt32" => HostType::Int32,
                "ToInt64" => HostType::Int64,
                "ToDecimal" => HostType::Decimal,
                "ToDouble" => HostType::Float64,
                "ToBoolean" => HostType::Bool,
                "ToString" => return Some(Ok(Value::String(v.to_string()))),
                _ => return None,
            };
            convert(v.clone(), &ty)
        }
        _ => return None,
    };
    Some(r)
}

/// Built-in method call. `None` when the method is not built in.
pub fn call(
    owner: &HostType,
    target: Option<&Value>,
    method: &str,
    args: &[Value],
) -> Option<EvalResult<Value>> {
    match target {
        Some(Value::Null) if method == "GetValueOrDefault" => {
            Some(Ok(args.first().cloned().unwrap_or(Value::Null)))
        }
        Some(Value::Null) => Some(Err(EvalError::NullReference(format!("calling '{}'", method)))),
        Some(t) => instance_method(t, method, args),
        None => static_method(&owner.to_string(), method, args),
    }
}

/// Built-in constructors. `None` when the type has no built-in constructor.
pub fn construct(ty: &HostType, members: &[String], args: &[Value]) -> Option<EvalResult<Value>> {
    let invalid = |what: &str| EvalError::InvalidArgument(format!("new {}: {}", ty, what));
    let ints: Option<Vec<i64>> = args.iter().map(Value::as_i64).collect();
    let r = match ty.underlying() {
        HostType::DateTime => {
            let parts = ints?;
            let at = |i: usize| parts.get(i).copied().unwrap_or(0);
            let built = match parts.len() {
                3 | 6 | 7 => i32::try_from(at(0)).ok().and_then(|y| {
                    NaiveDate::from_ymd_opt(y, at(1) as u32, at(2) as u32)?.and_hms_milli_opt(
                        at(3) as u32,
                        at(4) as u32,
                        at(5) as u32,
                        at(6) as u32,
                    )
                }),
                _ => return Some(Err(invalid("expected 3, 6 or 7 integer arguments"))),
            };
            built
                .map(Value::DateTime)
                .ok_or_else(|| invalid("date/time component out of range"))
        }
        HostType::TimeSpan => {
            let parts = ints?;
            let seconds = |d: i64, h: i64, m: i64, s: i64| ((d * 24 + h) * 60 + m) * 60 + s;
            let ticks = match parts.as_slice() {
                [t] => *t,
                [h, m, s] => seconds(0, *h, *m, *s) * TICKS_PER_SECOND,
                [d, h, m, s] => seconds(*d, *h, *m, *s) * TICKS_PER_SECOND,
                [d, h, m, s, ms] => {
                    seconds(*d, *h, *m, *s) * TICKS_PER_SECOND + ms * TICKS_PER_MILLISECOND
                }
                _ => return Some(Err(invalid("unsupported argument count"))),
            };
            Ok(Value::TimeSpan(TimeSpan(ticks)))
        }
        HostType::Guid => match args {
            [Value::String(s)] => Uuid::parse_str(s)
                .map(Value::Guid)
                .map_err(|e| invalid(&e.to_string())),
            [] => Ok(Value::Guid(Uuid::nil())),
            _ => Err(invalid("expected a string")),
        },
        HostType::Decimal => match args {
            [v] => convert(v.clone(), &HostType::Decimal),
            _ => return None,
        },
        HostType::String => match args {
            [Value::Char(c), n] => match n.as_i64().and_then(|n| usize::try_from(n).ok()) {
                Some(count) => Ok(Value::String(std::iter::repeat_n(*c, count).collect())),
                None => Err(invalid("count must be a non-negative integer")),
            },
            _ => return None,
        },
        HostType::List(_) | HostType::Array(_) => match args {
            [] => Ok(Value::List(Vec::new())),
            [Value::List(items)] => Ok(Value::List(items.clone())),
            // Capacity argument
            [Value::Int(_)] => Ok(Value::List(Vec::new())),
            _ => Err(invalid("expected a collection or capacity")),
        },
        HostType::Entity(name) | HostType::Object(name) => {
            let mut record = Record::new(name.clone());
            for (i, v) in args.iter().enumerate() {
                let field = members
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("Item{}", i + 1));
                record.fields.push((field, v.clone()));
            }
            Ok(Value::Object(record))
        }
        _ => return None,
    };
    Some(r)
}
