//! Conversion of typed filter text to field values.
//!
//! Conversion never fails: text that does not fit the field type becomes
//! [`Value::Null`] for typed fields and stays text for selections.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use chrono_tz::Tz;
use domain_model_rs::{FieldDescriptor, FieldType, Value};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::{ParserConfig, TimedeltaUnit};

const ISO_DATE: &str = "%Y-%m-%d";

/// Locale-aware converter between filter text and values.
#[derive(Debug, Clone)]
pub struct Locale {
    pub(crate) config: ParserConfig,
    pub(crate) timezone: Option<Tz>,
}

impl Locale {
    pub fn new(config: ParserConfig) -> Self {
        let timezone = config.timezone();
        Self { config, timezone }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Converts the text typed for `field` to a value of the field's type.
    pub fn convert(&self, field: &FieldDescriptor, text: &str) -> Value {
        match field.field_type {
            FieldType::Char
            | FieldType::Text
            | FieldType::Reference
            | FieldType::Many2One
            | FieldType::One2One
            | FieldType::One2Many
            | FieldType::Many2Many => return Value::String(text.to_string()),
            _ => {}
        }

        if text.trim().is_empty() {
            return Value::Null;
        }

        let value = match field.field_type {
            FieldType::Boolean => Some(self.convert_boolean(text)),
            FieldType::Integer => self.convert_integer(field, text),
            FieldType::Float => self.convert_float(field, text),
            FieldType::Numeric => self.convert_numeric(field, text),
            FieldType::Selection | FieldType::MultiSelection => Some(
                field
                    .selection_key(text)
                    .cloned()
                    .unwrap_or_else(|| Value::String(text.to_string())),
            ),
            FieldType::Date => self.parse_date(text).map(Value::Date),
            FieldType::DateTime => self.parse_datetime(text).map(Value::DateTime),
            FieldType::Time => self.parse_time(field, text).map(Value::Time),
            FieldType::TimeDelta => {
                parse_timedelta(&self.normalize_number(text), &self.config.timedelta_units)
                    .map(Value::TimeDelta)
            }
            _ => Some(Value::String(text.to_string())),
        };

        value.unwrap_or_else(|| {
            debug!(field = %field.name, text, "value does not convert, using null");
            Value::Null
        })
    }

    fn convert_boolean(&self, text: &str) -> Value {
        Value::Boolean(self.reads_true(text))
    }

    /// Returns true if `text` is a prefix of one of the configured true words.
    pub(crate) fn reads_true(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.config
            .true_words
            .iter()
            .any(|word| word.to_lowercase().starts_with(&text))
    }

    /// Strips the grouping separator and uses `.` as decimal point.
    fn normalize_number(&self, text: &str) -> String {
        text.trim()
            .chars()
            .filter(|c| Some(*c) != self.config.thousands_sep)
            .map(|c| if c == self.config.decimal_point { '.' } else { c })
            .collect()
    }

    fn parse_decimal(&self, text: &str) -> Option<Decimal> {
        let normalized = self.normalize_number(text);
        Decimal::from_str(&normalized)
            .ok()
            .or_else(|| normalized.parse::<f64>().ok().and_then(Decimal::from_f64))
    }

    fn convert_integer(&self, field: &FieldDescriptor, text: &str) -> Option<Value> {
        let factor = Decimal::from_f64(field.factor())?;
        let value = self.parse_decimal(text)?.checked_div(factor)?;
        value.trunc().to_i64().map(Value::Integer)
    }

    fn convert_float(&self, field: &FieldDescriptor, text: &str) -> Option<Value> {
        let value = self.normalize_number(text).parse::<f64>().ok()?;
        Some(Value::Float(value / field.factor()))
    }

    fn convert_numeric(&self, field: &FieldDescriptor, text: &str) -> Option<Value> {
        let factor = Decimal::from_f64(field.factor())?;
        self.parse_decimal(text)?
            .checked_div(factor)
            .map(Value::Numeric)
    }

    pub(crate) fn parse_date(&self, text: &str) -> Option<NaiveDate> {
        let text = text.trim();
        [self.config.date_format.as_str(), ISO_DATE]
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
    }

    /// Parses a datetime typed in the configured timezone and returns it in UTC.
    pub(crate) fn parse_datetime(&self, text: &str) -> Option<NaiveDateTime> {
        let text = text.trim();
        let date_format = &self.config.date_format;
        let formats = [
            format!("{} {}", date_format, self.config.time_format),
            format!("{} %H:%M:%S", date_format),
            format!("{} %H:%M", date_format),
            format!("{} %H:%M:%S", ISO_DATE),
            format!("{}T%H:%M:%S", ISO_DATE),
        ];
        let local = formats
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .or_else(|| {
                self.parse_date(text)
                    .map(|date| date.and_time(NaiveTime::default()))
            })?;
        Some(self.to_utc(local))
    }

    fn to_utc(&self, local: NaiveDateTime) -> NaiveDateTime {
        let Some(tz) = self.timezone else {
            return local;
        };
        match tz.from_local_datetime(&local).earliest() {
            Some(datetime) => datetime.naive_utc(),
            None => {
                debug!(%local, timezone = %tz, "nonexistent local time, reading it as UTC");
                local
            }
        }
    }

    /// Expresses a UTC datetime in the configured timezone.
    pub(crate) fn to_local(&self, utc: NaiveDateTime) -> NaiveDateTime {
        match self.timezone {
            Some(tz) => tz.from_utc_datetime(&utc).naive_local(),
            None => utc,
        }
    }

    pub(crate) fn time_format<'a>(&'a self, field: &'a FieldDescriptor) -> &'a str {
        field.format.as_deref().unwrap_or(&self.config.time_format)
    }

    fn parse_time(&self, field: &FieldDescriptor, text: &str) -> Option<NaiveTime> {
        let text = text.trim();
        [self.time_format(field), "%H:%M:%S", "%H:%M:%S%.f", "%H:%M"]
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(text, format).ok())
    }

    /// Splits `"Label,rest"` typed for a reference field into the target
    /// model named by `Label` and the remaining text.
    pub fn split_target_value(&self, field: &FieldDescriptor, text: &str) -> Option<(String, String)> {
        field.options().iter().find_map(|option| {
            let label_len = option.label().chars().count();
            let head: String = text.chars().take(label_len).collect();
            let separated = text.chars().nth(label_len) == Some(',');
            if !separated || head.to_lowercase() != option.label().to_lowercase() {
                return None;
            }
            let model = match option.key() {
                Value::String(model) => model.clone(),
                _ => return None,
            };
            Some((model, text.chars().skip(label_len + 1).collect()))
        })
    }
}

/// Parses a timedelta such as `1d 2h`, `1w`, `2:30` or `-1d 02:03:04`.
///
/// A number without suffix counts seconds; `h:m[:s]` groups count hours,
/// minutes and seconds. Returns `None` for text that is not a timedelta.
pub fn parse_timedelta(text: &str, units: &[TimedeltaUnit]) -> Option<TimeDelta> {
    let mut seconds = 0.0;
    let mut sign = 1.0;
    let mut seen = false;

    for (index, part) in text.split_whitespace().enumerate() {
        let mut part = part;
        if index == 0 {
            if let Some(rest) = part.strip_prefix('-') {
                sign = -1.0;
                part = rest;
            }
        }
        if part.contains(':') {
            for (piece, scale) in part.split(':').zip([3_600.0, 60.0, 1.0]) {
                seconds += piece.parse::<f64>().ok()? * scale;
            }
        } else {
            seconds += parse_unit_segments(part, units)?;
        }
        seen = true;
    }

    if !seen || !seconds.is_finite() {
        return None;
    }
    Some(TimeDelta::microseconds((sign * seconds * 1_000_000.0).round() as i64))
}

/// Sums segments like `1d2h` of a single whitespace-free part.
fn parse_unit_segments(part: &str, units: &[TimedeltaUnit]) -> Option<f64> {
    let mut total = 0.0;
    let mut number = String::new();
    let mut suffix = String::new();

    for c in part.chars() {
        if c.is_ascii_digit() || c == '.' {
            if !suffix.is_empty() {
                total += segment_seconds(&number, &suffix, units)?;
                number.clear();
                suffix.clear();
            }
            number.push(c);
        } else {
            suffix.push(c);
        }
    }
    if number.is_empty() && suffix.is_empty() {
        return Some(total);
    }
    Some(total + segment_seconds(&number, &suffix, units)?)
}

fn segment_seconds(number: &str, suffix: &str, units: &[TimedeltaUnit]) -> Option<f64> {
    let count = number.parse::<f64>().ok()?;
    if suffix.is_empty() {
        return Some(count);
    }
    units
        .iter()
        .find(|unit| unit.suffix == suffix)
        .map(|unit| count * unit.seconds as f64)
}
