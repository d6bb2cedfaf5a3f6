//! Timestamp stage

use crate::core::error::Result;
use crate::core::format::Format;
use crate::core::record::LogRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a timestamp is rendered
///
/// # Examples
///
/// ```
/// use logfan::formats::TimestampFormat;
/// use chrono::Utc;
///
/// let stamp = TimestampFormat::Iso8601.format(&Utc::now());
/// assert!(stamp.ends_with('Z'));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,
    /// `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,
    /// `2025-01-08T10:30:45+00:00`
    Rfc3339,
    /// Seconds since the epoch
    Unix,
    UnixMillis,
    UnixMicros,
    /// Any strftime pattern, e.g. `%d/%b/%Y:%H:%M:%S %z`
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Iso8601Micros => datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::Unix => datetime.timestamp().to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::UnixMicros => datetime.timestamp_micros().to_string(),
            TimestampFormat::Custom(pattern) => datetime.format(pattern).to_string(),
        }
    }

    /// Field value: a number for the Unix variants, a string otherwise
    #[must_use]
    pub fn value(&self, datetime: &DateTime<Utc>) -> Value {
        match self {
            TimestampFormat::Unix => Value::from(datetime.timestamp()),
            TimestampFormat::UnixMillis => Value::from(datetime.timestamp_millis()),
            TimestampFormat::UnixMicros => Value::from(datetime.timestamp_micros()),
            _ => Value::String(self.format(datetime)),
        }
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TimestampFormat::Unix | TimestampFormat::UnixMillis | TimestampFormat::UnixMicros
        )
    }
}

/// Adds the current time to every record
///
/// # Examples
///
/// ```
/// use logfan::formats::{Json, Timestamp, TimestampFormat};
/// use logfan::{Format, LogRecord, Pipeline};
///
/// let pipeline = Pipeline::new()
///     .stage(Timestamp::new().with_format(TimestampFormat::UnixMillis))
///     .stage(Json::new());
///
/// let out = pipeline.transform(LogRecord::new("info", "x")).unwrap().unwrap();
/// assert!(out.get("timestamp").unwrap().is_number());
/// ```
#[derive(Debug, Clone)]
pub struct Timestamp {
    format: TimestampFormat,
    key: String,
}

impl Timestamp {
    pub fn new() -> Self {
        Self {
            format: TimestampFormat::default(),
            key: "timestamp".to_string(),
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: TimestampFormat) -> Self {
        self.format = format;
        self
    }

    /// Write the time under `key` instead of `timestamp`
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::new()
    }
}

impl Format for Timestamp {
    fn transform(&self, mut record: LogRecord) -> Result<Option<LogRecord>> {
        record.insert(self.key.clone(), self.format.value(&Utc::now()));
        Ok(Some(record))
    }

    fn name(&self) -> &str {
        "timestamp"
    }
}
