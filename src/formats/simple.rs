//! Human-oriented one-line format

use crate::core::error::Result;
use crate::core::format::Format;
use crate::core::record::LogRecord;
use serde_json::Value;

/// `level: message {"rest":"as json"}`
///
/// The JSON tail is omitted when the record carries nothing but level and
/// message.
#[derive(Debug, Clone, Default)]
pub struct Simple;

impl Simple {
    pub fn new() -> Self {
        Self
    }
}

impl Format for Simple {
    fn transform(&self, mut record: LogRecord) -> Result<Option<LogRecord>> {
        let rest = record.metadata();
        let head = format!(
            "{}: {}",
            record.level().unwrap_or_default(),
            record.message_text()
        );
        let payload = if rest.is_empty() {
            head
        } else {
            format!("{} {}", head, serde_json::to_string(&Value::Object(rest))?)
        };
        record.set_payload(payload);
        Ok(Some(record))
    }

    fn name(&self) -> &str {
        "simple"
    }
}
