use crate::level::Severity;
use crate::value::{Fields, Value};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Default `asctime` layout for templates that do not configure one.
pub const DEFAULT_DATEFMT: &str = "%Y-%m-%d %H:%M:%S";

/// A single log event, immutable once built by a [`Logger`](crate::Logger).
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub logger_name: String,
    pub level: Severity,
    /// Message with positional arguments already interpolated.
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Persistent logger fields overlaid with per-call fields.
    pub fields: Fields,
}

impl LogRecord {
    pub fn new(logger_name: impl Into<String>, level: Severity, message: impl Into<String>, fields: Fields) -> Self {
        Self {
            logger_name: logger_name.into(),
            level,
            message: message.into(),
            timestamp: Utc::now(),
            fields,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Millisecond part of the timestamp.
    pub fn msecs(&self) -> u32 {
        self.timestamp.timestamp_subsec_millis()
    }

    /// Render the timestamp with a strftime layout that has already been
    /// validated by [`validate_datefmt`].
    pub fn format_time(&self, datefmt: &str) -> String {
        self.timestamp.format(datefmt).to_string()
    }

    /// Resolve a named record attribute, falling back to `fields`.
    ///
    /// Attributes shadow fields of the same name.
    pub fn attribute(&self, key: &str, datefmt: Option<&str>) -> Option<Value> {
        let value = match key {
            "name" => Value::Str(self.logger_name.clone()),
            "levelname" => Value::Str(self.level.name().to_string()),
            "levelno" => Value::from(self.level.rank()),
            "message" => Value::Str(self.message.clone()),
            "asctime" => Value::Str(self.format_time(datefmt.unwrap_or(DEFAULT_DATEFMT))),
            "msecs" => Value::from(self.msecs()),
            "created" => Value::Float(self.timestamp.timestamp_millis() as f64 / 1000.0),
            _ => return self.fields.get(key).cloned(),
        };
        Some(value)
    }
}

/// Check a strftime layout up front so rendering can never fail later.
pub fn validate_datefmt(datefmt: &str) -> Result<(), crate::LogError> {
    use chrono::format::{Item, StrftimeItems};

    if StrftimeItems::new(datefmt).any(|item| matches!(item, Item::Error)) {
        return Err(crate::LogError::InvalidDateFormat(datefmt.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> LogRecord {
        let ts = Utc.with_ymd_and_hms(2015, 6, 1, 12, 30, 45).unwrap() + chrono::Duration::milliseconds(123);
        LogRecord::new("app.db", Severity::Warning, "slow query", crate::fields! { "ms" => 950, "name" => "shadowed" })
            .with_timestamp(ts)
    }

    #[test]
    fn test_attributes() {
        let r = record();
        assert_eq!(r.attribute("name", None), Some(Value::from("app.db")));
        assert_eq!(r.attribute("levelname", None), Some(Value::from("WARNING")));
        assert_eq!(r.attribute("levelno", None), Some(Value::from(30u8)));
        assert_eq!(r.attribute("asctime", None), Some(Value::from("2015-06-01 12:30:45")));
        assert_eq!(r.attribute("asctime", Some("%Y")), Some(Value::from("2015")));
        assert_eq!(r.attribute("msecs", None), Some(Value::from(123u32)));
        assert_eq!(r.attribute("ms", None), Some(Value::from(950)));
        assert_eq!(r.attribute("missing", None), None);
    }

    #[test]
    fn test_validate_datefmt() {
        assert!(validate_datefmt("%Y-%m-%d").is_ok());
        assert!(validate_datefmt("plain text").is_ok());
        assert!(matches!(validate_datefmt("%Q"), Err(crate::LogError::InvalidDateFormat(_))));
    }
}
