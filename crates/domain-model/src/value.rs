//! Clause values and their wire encoding.
//!
//! A [`Value`] is the right-hand side of a clause and the type of every entry
//! in an evaluation context. Temporal and decimal values travel over the wire
//! as `{"__class__": ..}` objects, everything else maps onto plain JSON.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Number};

use crate::error::{ModelError, ModelResult};

/// Known field values, keyed by field name.
///
/// Evaluation and inversion read it; a missing key means the value is unknown.
pub type Context = HashMap<String, Value>;

/// A typed literal held by a clause or a context entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    /// Fixed-point number, used by `numeric` fields.
    Numeric(Decimal),
    String(String),
    Date(NaiveDate),
    /// A naive datetime, always expressed in UTC.
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    TimeDelta(TimeDelta),
    List(Vec<Value>),
    /// A `(model, id)` pair pointing at a record of another model.
    Reference(String, i64),
}

impl Value {
    /// Returns true if the value is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if the value is a list.
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Returns true for dates, datetimes and times.
    pub fn is_temporal(&self) -> bool {
        matches!(self, Value::Date(_) | Value::DateTime(_) | Value::Time(_))
    }

    /// Truthiness in the sense of a filled-in form field.
    ///
    /// Null, `false`, zero, the empty string and the empty list are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Numeric(d) => !d.is_zero(),
            Value::String(s) => !s.is_empty(),
            Value::TimeDelta(d) => *d != TimeDelta::zero(),
            Value::List(items) => !items.is_empty(),
            Value::Date(_) | Value::DateTime(_) | Value::Time(_) | Value::Reference(_, _) => true,
        }
    }

    /// Returns the string slice if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a float if it is any kind of number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Numeric(d) => d.to_f64(),
            _ => None,
        }
    }

    fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_) | Value::Numeric(_))
    }

    /// Equality with numeric coercion.
    ///
    /// Integers, floats and decimals compare by magnitude, a date equals the
    /// midnight datetime of the same day, and lists compare element-wise.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (a, b) if a.is_number() && b.is_number() => {
                a.loose_cmp(b) == Some(Ordering::Equal)
            }
            (Value::Date(_), Value::DateTime(_)) | (Value::DateTime(_), Value::Date(_)) => {
                self.loose_cmp(other) == Some(Ordering::Equal)
            }
            _ => self == other,
        }
    }

    /// Ordering between values of compatible types.
    ///
    /// Returns `None` when either side is null or the types cannot be ordered
    /// against each other.
    pub fn loose_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Numeric(a), Value::Numeric(b)) => Some(a.cmp(b)),
            (Value::Numeric(a), Value::Integer(b)) => Some(a.cmp(&Decimal::from(*b))),
            (Value::Integer(a), Value::Numeric(b)) => Some(Decimal::from(*a).cmp(b)),
            (a, b) if a.is_number() && b.is_number() => a.as_f64()?.partial_cmp(&b.as_f64()?),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::DateTime(b)) => Some(a.and_time(NaiveTime::default()).cmp(b)),
            (Value::DateTime(a), Value::Date(b)) => Some(a.cmp(&b.and_time(NaiveTime::default()))),
            (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
            (Value::TimeDelta(a), Value::TimeDelta(b)) => Some(a.cmp(b)),
            (Value::Reference(ma, ia), Value::Reference(mb, ib)) => Some((ma, ia).cmp(&(mb, ib))),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.loose_cmp(y)? {
                        Ordering::Equal => continue,
                        ordering => return Some(ordering),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) => 2,
            Value::Float(_) => 3,
            Value::Numeric(_) => 4,
            Value::String(_) => 5,
            Value::Date(_) => 6,
            Value::DateTime(_) => 7,
            Value::Time(_) => 8,
            Value::TimeDelta(_) => 9,
            Value::Reference(_, _) => 10,
            Value::List(_) => 11,
        }
    }

    /// A total order over all values, used to sort domains canonically.
    ///
    /// Values of different variants are ordered by variant; floats use IEEE
    /// total ordering so the result never depends on the input order.
    pub fn canonical_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.canonical_cmp(y) {
                        Ordering::Equal => continue,
                        ordering => return ordering,
                    }
                }
                a.len().cmp(&b.len())
            }
            (a, b) if a.rank() == b.rank() => a.loose_cmp(b).unwrap_or(Ordering::Equal),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    /// The smallest representable value of the same temporal type.
    ///
    /// Used when a context lacks a date-like value that a clause compares
    /// against.
    pub fn temporal_minimum(&self) -> Option<Value> {
        match self {
            Value::Date(_) => Some(Value::Date(NaiveDate::MIN)),
            Value::DateTime(_) => Some(Value::DateTime(NaiveDateTime::MIN)),
            Value::Time(_) => Some(Value::Time(NaiveTime::default())),
            _ => None,
        }
    }

    /// Encodes the value into its JSON wire representation.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => json!(i),
            Value::Float(f) => Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Numeric(d) => json!({
                "__class__": "Decimal",
                "decimal": d.to_string(),
            }),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Date(d) => json!({
                "__class__": "date",
                "year": d.year(),
                "month": d.month(),
                "day": d.day(),
            }),
            Value::DateTime(dt) => json!({
                "__class__": "datetime",
                "year": dt.year(),
                "month": dt.month(),
                "day": dt.day(),
                "hour": dt.hour(),
                "minute": dt.minute(),
                "second": dt.second(),
                "microsecond": dt.nanosecond() / 1_000,
            }),
            Value::Time(t) => json!({
                "__class__": "time",
                "hour": t.hour(),
                "minute": t.minute(),
                "second": t.second(),
                "microsecond": t.nanosecond() / 1_000,
            }),
            Value::TimeDelta(d) => {
                let micros = d
                    .num_microseconds()
                    .unwrap_or_else(|| d.num_milliseconds().saturating_mul(1_000));
                json!({
                    "__class__": "timedelta",
                    "seconds": micros as f64 / 1_000_000.0,
                })
            }
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Reference(model, id) => serde_json::Value::String(format!("{},{}", model, id)),
        }
    }

    /// Decodes a value from its JSON wire representation.
    ///
    /// References arrive as `"model,id"` strings and decode as
    /// [`Value::String`]; the caller knows from the field type what they mean.
    pub fn from_json(json: &serde_json::Value) -> ModelResult<Value> {
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Boolean(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::Integer(i)),
                None => n
                    .as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| ModelError::invalid_value(format!("number out of range: {}", n))),
            },
            serde_json::Value::String(s) => Ok(Value::String(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Value::from_json)
                .collect::<ModelResult<Vec<_>>>()
                .map(Value::List),
            serde_json::Value::Object(object) => decode_class(object),
        }
    }
}

fn int_member(object: &Map<String, serde_json::Value>, key: &str) -> ModelResult<i64> {
    match object.get(key) {
        None => Ok(0),
        Some(member) => member
            .as_i64()
            .ok_or_else(|| ModelError::invalid_value(format!("'{}' is not an integer", key))),
    }
}

fn decode_time(object: &Map<String, serde_json::Value>) -> ModelResult<NaiveTime> {
    let hour = int_member(object, "hour")? as u32;
    let minute = int_member(object, "minute")? as u32;
    let second = int_member(object, "second")? as u32;
    let micro = int_member(object, "microsecond")? as u32;
    NaiveTime::from_hms_micro_opt(hour, minute, second, micro)
        .ok_or_else(|| ModelError::invalid_value("time out of range"))
}

fn decode_date(object: &Map<String, serde_json::Value>) -> ModelResult<NaiveDate> {
    let year = int_member(object, "year")? as i32;
    let month = int_member(object, "month")? as u32;
    let day = int_member(object, "day")? as u32;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ModelError::invalid_value("date out of range"))
}

fn decode_class(object: &Map<String, serde_json::Value>) -> ModelResult<Value> {
    let class = object
        .get("__class__")
        .and_then(|c| c.as_str())
        .ok_or_else(|| ModelError::invalid_value("object without __class__"))?;

    match class {
        "date" => decode_date(object).map(Value::Date),
        "datetime" => Ok(Value::DateTime(decode_date(object)?.and_time(decode_time(object)?))),
        "time" => decode_time(object).map(Value::Time),
        "timedelta" => {
            let seconds = object
                .get("seconds")
                .and_then(|s| s.as_f64())
                .ok_or_else(|| ModelError::invalid_value("timedelta without seconds"))?;
            Ok(Value::TimeDelta(TimeDelta::microseconds(
                (seconds * 1_000_000.0).round() as i64,
            )))
        }
        "Decimal" => {
            let text = object
                .get("decimal")
                .and_then(|d| d.as_str())
                .ok_or_else(|| ModelError::invalid_value("Decimal without decimal"))?;
            text.parse::<Decimal>()
                .map(Value::Numeric)
                .map_err(|e| ModelError::invalid_value(format!("bad decimal '{}': {}", text, e)))
        }
        other => Err(ModelError::invalid_value(format!("unknown class '{}'", other))),
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Value::from_json(&json).map_err(serde::de::Error::custom)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Numeric(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl From<NaiveTime> for Value {
    fn from(value: NaiveTime) -> Self {
        Value::Time(value)
    }
}

impl From<TimeDelta> for Value {
    fn from(value: TimeDelta) -> Self {
        Value::TimeDelta(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
