use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::types::{EnumType, HostType};

/// Ticks per second (one tick is 100 ns).
pub const TICKS_PER_SECOND: i64 = 10_000_000;
pub const TICKS_PER_MILLISECOND: i64 = 10_000;

/// A duration stored as a tick count, rendered to SQL as that count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSpan(pub i64);

impl TimeSpan {
    pub fn from_ticks(ticks: i64) -> Self {
        TimeSpan(ticks)
    }

    pub fn from_seconds(seconds: i64) -> Self {
        TimeSpan(seconds.saturating_mul(TICKS_PER_SECOND))
    }

    pub fn ticks(&self) -> i64 {
        self.0
    }

    pub fn total_seconds(&self) -> f64 {
        self.0 as f64 / TICKS_PER_SECOND as f64
    }

    pub fn to_delta(&self) -> TimeDelta {
        TimeDelta::microseconds(self.0 / 10) + TimeDelta::nanoseconds((self.0 % 10) * 100)
    }
}

impl From<TimeDelta> for TimeSpan {
    fn from(d: TimeDelta) -> Self {
        let micros = d.num_microseconds().unwrap_or(i64::MAX / 10);
        let sub_micro = d.subsec_nanos().rem_euclid(1_000) as i64 / 100;
        TimeSpan(micros.saturating_mul(10).saturating_add(sub_micro))
    }
}

/// A host object: a captured closure, an anonymous projection or a constructed DTO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub type_name: String,
    pub fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field (builder style).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// An already-evaluated host value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Char(char),
    String(String),
    DateTime(NaiveDateTime),
    TimeSpan(TimeSpan),
    Guid(Uuid),
    /// Enum constant (type plus underlying integer)
    Enum { ty: Arc<EnumType>, value: i64 },
    List(Vec<Value>),
    Object(Record),
}

impl Value {
    /// Runtime type of this value.
    pub fn host_type(&self) -> HostType {
        match self {
            Value::Null => HostType::Null,
            Value::Bool(_) => HostType::Bool,
            Value::Int(_) => HostType::Int64,
            Value::Float(_) => HostType::Float64,
            Value::Decimal(_) => HostType::Decimal,
            Value::Char(_) => HostType::Char,
            Value::String(_) => HostType::String,
            Value::DateTime(_) => HostType::DateTime,
            Value::TimeSpan(_) => HostType::TimeSpan,
            Value::Guid(_) => HostType::Guid,
            Value::Enum { ty, .. } => HostType::Enum(ty.clone()),
            Value::List(items) => HostType::list_of(
                items
                    .iter()
                    .find(|v| !v.is_null())
                    .map(Value::host_type)
                    .unwrap_or(HostType::Null),
            ),
            Value::Object(r) => HostType::Object(r.type_name.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view (ints, enums, chars, integral decimals/floats).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Enum { value, .. } => Some(*value),
            Value::Char(c) => Some(*c as i64),
            Value::Decimal(d) if d.fract().is_zero() => d.to_i64(),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            Value::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn enum_value(ty: &Arc<EnumType>, value: i64) -> Self {
        Value::Enum {
            ty: ty.clone(),
            value,
        }
    }

    pub fn date(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(Value::DateTime)
    }
}

/// Host `ToString` form of a date/time: milliseconds only when present.
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() / 1_000_000 == 0 {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Char(c) => write!(f, "{}", c),
            Value::String(s) => write!(f, "{}", s),
            Value::DateTime(dt) => write!(f, "{}", format_datetime(dt)),
            Value::TimeSpan(ts) => write!(f, "{}", ts.ticks()),
            Value::Guid(u) => write!(f, "{}", u),
            Value::Enum { ty, value } => match ty.name_of(*value) {
                Some(name) => write!(f, "{}", name),
                None => write!(f, "{}", value),
            },
            Value::List(items) => {
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", v)?;
                }
                Ok(())
            }
            Value::Object(r) => write!(f, "{}", r.type_name),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Guid(u)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<TimeSpan> for Value {
    fn from(ts: TimeSpan) -> Self {
        Value::TimeSpan(ts)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Object(r)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_host_to_string() {
        assert_eq!(Value::Float(1.0).to_string(), "1");
        assert_eq!(Value::Decimal(Decimal::new(150, 2)).to_string(), "1.50");
        assert_eq!(Value::from(vec!["a", "b"]).to_string(), "a,b");
        let race = Arc::new(EnumType::new("Race").member("Elf", 1));
        assert_eq!(Value::enum_value(&race, 1).to_string(), "Elf");
        assert_eq!(Value::enum_value(&race, 7).to_string(), "7");
    }

    #[test]
    fn test_datetime_display_drops_zero_millis() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_milli_opt(8, 5, 0, 0)
            .unwrap();
        assert_eq!(Value::DateTime(dt).to_string(), "2024-03-09 08:05:00");
        let dt = dt.with_nanosecond(250_000_000).unwrap();
        assert_eq!(Value::DateTime(dt).to_string(), "2024-03-09 08:05:00.250");
    }

    #[test]
    fn test_timespan_from_delta() {
        let ts = TimeSpan::from(TimeDelta::seconds(2));
        assert_eq!(ts.ticks(), 2 * TICKS_PER_SECOND);
        assert_eq!(ts.to_delta(), TimeDelta::seconds(2));
    }

    #[test]
    fn test_list_host_type_skips_nulls() {
        let v = Value::List(vec![Value::Null, Value::from("x")]);
        assert_eq!(v.host_type(), HostType::list_of(HostType::String));
    }
}
