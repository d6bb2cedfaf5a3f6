//! JSON serializer, the default format

use crate::core::error::Result;
use crate::core::format::Format;
use crate::core::record::LogRecord;

/// Serializes every field of the record as one JSON object
///
/// # Examples
///
/// ```
/// use logfan::formats::Json;
/// use logfan::{Format, LogRecord};
///
/// let record = LogRecord::new("info", "ready").with_field("port", 8080);
/// let out = Json::new().transform(record).unwrap().unwrap();
/// assert_eq!(out.payload(), Some(r#"{"level":"info","message":"ready","port":8080}"#));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Json {
    pretty: bool,
}

impl Json {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Format for Json {
    fn transform(&self, mut record: LogRecord) -> Result<Option<LogRecord>> {
        let payload = if self.pretty {
            serde_json::to_string_pretty(&record)?
        } else {
            serde_json::to_string(&record)?
        };
        record.set_payload(payload);
        Ok(Some(record))
    }

    fn name(&self) -> &str {
        "json"
    }
}
