//! Formatting of field values back to filter text.
//!
//! Mirrors the converters in `convert`: formatting a value and converting
//! the text again yields an equal value.

use std::fmt::{Display, Write};

use chrono::{NaiveTime, TimeDelta, Timelike};
use domain_model_rs::{FieldDescriptor, FieldType, Value};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use super::convert::Locale;
use super::text::quote;
use crate::config::TimedeltaUnit;

const SECONDS_PER_DAY: i64 = 86_400;
const TRUE_WORD: &str = "True";
const FALSE_WORD: &str = "False";
const FULL_TIME: &str = "%H:%M:%S";
const FULL_TIME_MICROS: &str = "%H:%M:%S%.6f";

/// Renders a chrono formatting item, `None` if the format string is invalid.
fn render(item: impl Display) -> Option<String> {
    let mut text = String::new();
    write!(text, "{}", item).ok()?;
    Some(text)
}

impl Locale {
    /// Formats a value of `field` as filter text, without quoting.
    pub fn format(&self, field: &FieldDescriptor, value: &Value) -> String {
        match (field.field_type, value) {
            (_, Value::Null) => String::new(),
            (_, Value::List(items)) => self.format_list(field, items),
            (FieldType::Integer | FieldType::Float | FieldType::Numeric, _) => {
                self.format_number(field, value)
            }
            (FieldType::Selection | FieldType::MultiSelection, _) => field
                .selection_label(value)
                .map(str::to_string)
                .unwrap_or_else(|| self.format_plain(value)),
            (FieldType::Time, Value::Time(time)) => self.format_time(field, *time),
            _ => self.format_plain(value),
        }
    }

    /// Formats list items, quoted and separated by `;`.
    ///
    /// A single item keeps a trailing `;` so that it still reads as a list.
    fn format_list(&self, field: &FieldDescriptor, items: &[Value]) -> String {
        let formatted: Vec<String> = items
            .iter()
            .map(|item| quote(&self.format(field, item)))
            .collect();
        match formatted.as_slice() {
            [single] => format!("{};", single),
            _ => formatted.join(";"),
        }
    }

    /// Formats a number scaled by the field factor.
    ///
    /// The field's `digits` only apply when rounding keeps the value, so the
    /// text always converts back to the same number.
    fn format_number(&self, field: &FieldDescriptor, value: &Value) -> String {
        let factor = field.factor();
        let text = match value {
            Value::Integer(i) if factor == 1.0 => i.to_string(),
            Value::Numeric(d) => {
                let scaled = Decimal::from_f64(factor)
                    .and_then(|factor| d.checked_mul(factor))
                    .unwrap_or(*d);
                match field.digits {
                    Some(digits) if scaled.round_dp(digits) == scaled => {
                        format!("{:.*}", digits as usize, scaled)
                    }
                    _ => scaled.to_string(),
                }
            }
            other => match other.as_f64() {
                Some(number) => {
                    let scaled = number * factor;
                    let rounded = field
                        .digits
                        .map(|digits| format!("{:.*}", digits as usize, scaled))
                        .filter(|text| text.parse::<f64>() == Ok(scaled));
                    rounded.unwrap_or_else(|| scaled.to_string())
                }
                None => return self.format_plain(other),
            },
        };
        self.localize_number(&text)
    }

    /// Formats a time with the field's format, or with seconds when that
    /// format would drop some.
    fn format_time(&self, field: &FieldDescriptor, time: NaiveTime) -> String {
        let format = self.time_format(field);
        let text = render(time.format(format)).unwrap_or_else(|| time.to_string());
        if NaiveTime::parse_from_str(&text, format).ok() == Some(time) {
            return text;
        }
        let fallback = if time.nanosecond() == 0 {
            FULL_TIME
        } else {
            FULL_TIME_MICROS
        };
        time.format(fallback).to_string()
    }

    /// Applies the configured decimal point and digit grouping.
    fn localize_number(&self, text: &str) -> String {
        let (sign, unsigned) = match text.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", text),
        };
        let (integer, fraction) = match unsigned.split_once('.') {
            Some((integer, fraction)) => (integer, Some(fraction)),
            None => (unsigned, None),
        };

        let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
        let digits: Vec<char> = integer.chars().collect();
        for (index, digit) in digits.iter().enumerate() {
            if let Some(sep) = self.config.thousands_sep {
                if index > 0 && (digits.len() - index) % 3 == 0 {
                    grouped.push(sep);
                }
            }
            grouped.push(*digit);
        }

        match fraction {
            Some(fraction) => format!("{}{}{}{}", sign, grouped, self.config.decimal_point, fraction),
            None => format!("{}{}", sign, grouped),
        }
    }

    /// The word written for true: `True` when the configured words read it
    /// back as true, else the first configured word.
    fn true_word(&self) -> String {
        let first = self
            .config
            .true_words
            .iter()
            .find(|word| !word.trim().is_empty());
        match first {
            Some(word) if !self.reads_true(TRUE_WORD) => word.clone(),
            _ => TRUE_WORD.to_string(),
        }
    }

    /// Formats a value without field-specific knowledge.
    pub fn format_plain(&self, value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::Boolean(true) => self.true_word(),
            Value::Boolean(false) => FALSE_WORD.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => self.localize_number(&f.to_string()),
            Value::Numeric(d) => self.localize_number(&d.to_string()),
            Value::String(s) => s.clone(),
            Value::Date(date) => {
                render(date.format(&self.config.date_format)).unwrap_or_else(|| date.to_string())
            }
            Value::DateTime(utc) => {
                let local = self.to_local(*utc);
                let format = format!("{} {}", self.config.date_format, self.config.time_format);
                render(local.format(&format)).unwrap_or_else(|| local.to_string())
            }
            Value::Time(time) => {
                render(time.format(&self.config.time_format)).unwrap_or_else(|| time.to_string())
            }
            Value::TimeDelta(delta) => format_timedelta(*delta, &self.config.timedelta_units),
            Value::List(items) => items
                .iter()
                .map(|item| quote(&self.format_plain(item)))
                .collect::<Vec<_>>()
                .join(";"),
            Value::Reference(model, id) => format!("{},{}", model, id),
        }
    }
}

/// Formats a timedelta as `1d 02:03:04`.
///
/// Units of at least a day are written with their suffix; the rest is
/// written as `HH:MM`, with seconds and microseconds only when non-zero.
pub fn format_timedelta(delta: TimeDelta, units: &[TimedeltaUnit]) -> String {
    let negative = delta < TimeDelta::zero();
    let delta = delta.abs();
    let mut seconds = delta.num_seconds();
    let micros = delta.subsec_nanos() / 1_000;

    let mut long_units: Vec<&TimedeltaUnit> = units
        .iter()
        .filter(|unit| unit.seconds >= SECONDS_PER_DAY)
        .collect();
    long_units.sort_by(|a, b| b.seconds.cmp(&a.seconds));

    let mut parts = Vec::new();
    for unit in long_units {
        let count = seconds / unit.seconds;
        seconds -= count * unit.seconds;
        if count > 0 {
            parts.push(format!("{}{}", count, unit.suffix));
        }
    }

    let (hours, minutes, secs) = (seconds / 3_600, seconds % 3_600 / 60, seconds % 60);
    if seconds > 0 || micros > 0 || parts.is_empty() {
        let mut clock = format!("{:02}:{:02}", hours, minutes);
        if secs > 0 || micros > 0 {
            clock.push_str(&format!(":{:02}", secs));
        }
        if micros > 0 {
            clock.push_str(&format!(".{:06}", micros));
        }
        parts.push(clock);
    }

    let text = parts.join(" ");
    if negative {
        format!("-{}", text)
    } else {
        text
    }
}
