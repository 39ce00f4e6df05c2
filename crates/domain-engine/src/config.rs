//! Parser configuration.
//!
//! The locale-dependent parts of the filter language are injected through a
//! [`ParserConfig`]: date and time formats, number separators, the timezone
//! typed datetimes are local to, the words that mean "true" and the timedelta
//! unit suffixes.
//!
//! # Example
//!
//! ```
//! use domain_engine_rs::ParserConfig;
//!
//! let config = ParserConfig::from_toml_str(
//!     r#"
//!     date_format = "%d/%m/%Y"
//!     decimal_point = ","
//!     timezone = "Europe/Brussels"
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.date_format, "%d/%m/%Y");
//! assert_eq!(config.decimal_point, ',');
//! assert!(config.timezone().is_some());
//! ```

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ParseError, ParseResult};

/// Current config schema version. Increment when making breaking changes.
pub const CONFIG_VERSION: u32 = 1;

const SECONDS_PER_DAY: i64 = 86_400;

/// A unit suffix accepted in timedelta values, such as `d` for days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedeltaUnit {
    /// Suffix typed after the number. Matched case-sensitively.
    pub suffix: String,
    /// Length of one unit in seconds.
    pub seconds: i64,
}

impl TimedeltaUnit {
    pub fn new(suffix: impl Into<String>, seconds: i64) -> Self {
        Self {
            suffix: suffix.into(),
            seconds,
        }
    }
}

/// Locale primitives used to convert filter text to typed values and back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Config schema version for migrations.
    pub version: u32,

    /// strftime format of dates.
    pub date_format: String,

    /// strftime format of times, also used for the time part of datetimes.
    pub time_format: String,

    pub decimal_point: char,

    /// Digit grouping separator, none by default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thousands_sep: Option<char>,

    /// IANA name of the timezone typed datetimes are expressed in.
    /// Datetimes are stored in UTC; `None` means UTC.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    /// Words meaning "true" for boolean fields; a typed prefix of any of them
    /// matches.
    pub true_words: Vec<String>,

    /// Timedelta unit suffixes.
    pub timedelta_units: Vec<TimedeltaUnit>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            date_format: "%Y-%m-%d".to_string(),
            time_format: "%H:%M:%S".to_string(),
            decimal_point: '.',
            thousands_sep: None,
            timezone: None,
            true_words: ["y", "yes", "true", "t", "1"]
                .iter()
                .map(|word| word.to_string())
                .collect(),
            timedelta_units: vec![
                TimedeltaUnit::new("Y", 365 * SECONDS_PER_DAY),
                TimedeltaUnit::new("M", 30 * SECONDS_PER_DAY),
                TimedeltaUnit::new("w", 7 * SECONDS_PER_DAY),
                TimedeltaUnit::new("d", SECONDS_PER_DAY),
                TimedeltaUnit::new("h", 3_600),
                TimedeltaUnit::new("m", 60),
                TimedeltaUnit::new("s", 1),
            ],
        }
    }
}

impl ParserConfig {
    /// Loads a configuration from TOML text. Missing keys keep their default.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidConfig`] if the text is not valid TOML,
    /// names an unknown timezone, declares a newer schema version, defines
    /// a timedelta unit of zero seconds or has no true word.
    pub fn from_toml_str(text: &str) -> ParseResult<Self> {
        let config: ParserConfig = toml::from_str(text)
            .map_err(|e| ParseError::invalid_config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        migrate_config(config)
    }

    /// Serializes the configuration to TOML text.
    pub fn to_toml_string(&self) -> ParseResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ParseError::invalid_config(format!("failed to serialize config: {}", e)))
    }

    /// Checks the values serde cannot check by itself.
    pub fn validate(&self) -> ParseResult<()> {
        if self.version > CONFIG_VERSION {
            return Err(ParseError::invalid_config(format!(
                "config version {} is newer than supported version {}",
                self.version, CONFIG_VERSION
            )));
        }
        if let Some(name) = &self.timezone {
            name.parse::<Tz>()
                .map_err(|e| ParseError::invalid_config(format!("timezone '{}': {}", name, e)))?;
        }
        if let Some(unit) = self.timedelta_units.iter().find(|unit| unit.seconds <= 0) {
            return Err(ParseError::invalid_config(format!(
                "timedelta unit '{}' must last at least one second",
                unit.suffix
            )));
        }
        if self.true_words.iter().all(|word| word.trim().is_empty()) {
            return Err(ParseError::invalid_config("true_words needs at least one word"));
        }
        if Some(self.decimal_point) == self.thousands_sep {
            return Err(ParseError::invalid_config(
                "decimal point and thousands separator must differ",
            ));
        }
        Ok(())
    }

    /// The configured timezone, `None` for UTC or an unknown name.
    pub fn timezone(&self) -> Option<Tz> {
        let name = self.timezone.as_deref()?;
        match name.parse::<Tz>() {
            Ok(tz) => Some(tz),
            Err(e) => {
                debug!(timezone = name, error = %e, "unknown timezone, using UTC");
                None
            }
        }
    }

}

/// Migrates a config to the current version.
fn migrate_config(mut config: ParserConfig) -> ParseResult<ParserConfig> {
    // version 1 is the initial schema
    config.version = CONFIG_VERSION;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ParserConfig::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.date_format, "%Y-%m-%d");
        assert_eq!(config.decimal_point, '.');
        assert!(config.thousands_sep.is_none());
        assert!(config.timezone().is_none());
        assert_eq!(config.true_words.len(), 5);
    }

    #[test]
    fn test_config_deserialization_empty() {
        let config = ParserConfig::from_toml_str("").unwrap();
        assert_eq!(config, ParserConfig::default());
    }

    #[test]
    fn test_config_deserialization_partial() {
        let config = ParserConfig::from_toml_str(
            r#"
            decimal_point = ","
            thousands_sep = "."
            true_words = ["ja", "oui"]
            "#,
        )
        .unwrap();
        assert_eq!(config.decimal_point, ',');
        assert_eq!(config.thousands_sep, Some('.'));
        assert_eq!(config.true_words, vec!["ja", "oui"]);
        assert_eq!(config.time_format, "%H:%M:%S");
    }

    #[test]
    fn test_config_timedelta_units_from_toml() {
        let config = ParserConfig::from_toml_str(
            r#"
            [[timedelta_units]]
            suffix = "j"
            seconds = 86400

            [[timedelta_units]]
            suffix = "h"
            seconds = 3600
            "#,
        )
        .unwrap();
        let suffixes: Vec<&str> = config
            .timedelta_units
            .iter()
            .map(|unit| unit.suffix.as_str())
            .collect();
        assert_eq!(suffixes, vec!["j", "h"]);
    }

    #[test]
    fn test_config_rejects_empty_true_words() {
        let result = ParserConfig::from_toml_str("true_words = []");
        assert!(matches!(result, Err(ParseError::InvalidConfig { .. })));
    }

    #[test]
    fn test_config_rejects_unknown_timezone() {
        let result = ParserConfig::from_toml_str(r#"timezone = "Mars/Olympus""#);
        assert!(matches!(result, Err(ParseError::InvalidConfig { .. })));
    }

    #[test]
    fn test_config_rejects_newer_version() {
        let result = ParserConfig::from_toml_str("version = 99");
        assert!(matches!(result, Err(ParseError::InvalidConfig { .. })));
    }

    #[test]
    fn test_config_rejects_invalid_toml() {
        let result = ParserConfig::from_toml_str("date_format = ");
        assert!(matches!(result, Err(ParseError::InvalidConfig { .. })));
    }

    #[test]
    fn test_config_rejects_same_separators() {
        let result = ParserConfig::from_toml_str(r#"thousands_sep = ".""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = ParserConfig {
            timezone: Some("Europe/Brussels".to_string()),
            ..ParserConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("version = 1"));
        assert!(text.contains("[[timedelta_units]]"));
        assert_eq!(ParserConfig::from_toml_str(&text).unwrap(), config);
    }
}
