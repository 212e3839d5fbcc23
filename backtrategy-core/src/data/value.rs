//! Owned cell values and the materialised current row.

use chrono::{DateTime, Utc};
use polars::prelude::{AnyValue, TimeUnit};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A single cell of the current row.
///
/// Floating point cells are held as exact decimals built from their shortest
/// round-trip text, so `1.1` in the table reads back as `Decimal` `1.1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    /// A finite float too large or too precise for `Decimal`.
    Float(f64),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            Value::Int(i) => Some(Decimal::from(*i)),
            _ => None,
        }
    }

    /// Integers, and decimals with no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Decimal(d) if d.fract().is_zero() => d.to_i64(),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Decimal(_) => "decimal",
            Value::Float(_) => "float",
            Value::Timestamp(_) => "timestamp",
            Value::Text(_) => "text",
        }
    }

    pub(crate) fn from_any(value: AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => Value::Null,
            AnyValue::Boolean(b) => Value::Bool(b),
            AnyValue::Int32(v) => Value::Int(i64::from(v)),
            AnyValue::Int64(v) => Value::Int(v),
            AnyValue::UInt32(v) => Value::Int(i64::from(v)),
            AnyValue::UInt64(v) => match i64::try_from(v) {
                Ok(i) => Value::Int(i),
                Err(_) => Value::Decimal(Decimal::from(v)),
            },
            AnyValue::Float32(v) => float_value(v.is_finite(), &v.to_string(), f64::from(v)),
            AnyValue::Float64(v) => float_value(v.is_finite(), &v.to_string(), v),
            AnyValue::String(s) => Value::Text(s.to_string()),
            AnyValue::Date(days) => DateTime::from_timestamp(i64::from(days) * 86_400, 0)
                .map(Value::Timestamp)
                .unwrap_or(Value::Null),
            AnyValue::Datetime(v, unit, _) => Value::Timestamp(timestamp_from_unit(v, unit)),
            other => Value::Text(other.to_string()),
        }
    }
}

fn float_value(finite: bool, shortest: &str, raw: f64) -> Value {
    if !finite {
        return Value::Null;
    }
    Decimal::from_str(shortest)
        .map(Value::Decimal)
        .unwrap_or(Value::Float(raw))
}

pub(crate) fn timestamp_from_unit(value: i64, unit: TimeUnit) -> DateTime<Utc> {
    let nanos = match unit {
        TimeUnit::Nanoseconds => value,
        TimeUnit::Microseconds => value.saturating_mul(1_000),
        TimeUnit::Milliseconds => value.saturating_mul(1_000_000),
    };
    DateTime::from_timestamp_nanos(nanos)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// The current row: its position in the series and every column's value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowView {
    index: usize,
    fields: BTreeMap<String, Value>,
}

impl RowView {
    pub(crate) fn new(index: usize, fields: BTreeMap<String, Value>) -> Self {
        Self { index, fields }
    }

    /// Zero-based row number within the bound series.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_fields(self) -> BTreeMap<String, Value> {
        self.fields
    }
}
