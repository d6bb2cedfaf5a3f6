//! Logfmt serializer (`key=value` pairs)

use crate::core::error::Result;
use crate::core::format::Format;
use crate::core::record::LogRecord;
use serde_json::Value;

/// `level=info message="Request processed" user=alice count=5`
///
/// `level` and `message` come first, then the remaining fields in key order.
/// Nested values are written as quoted JSON.
#[derive(Debug, Clone, Default)]
pub struct Logfmt;

impl Logfmt {
    pub fn new() -> Self {
        Self
    }

    fn render(record: &LogRecord) -> String {
        let mut parts = Vec::with_capacity(record.fields().len());
        if let Some(level) = record.level() {
            parts.push(format!("level={}", escape_value(level)));
        }
        parts.push(format!("message={}", quote_value(&record.message_text())));

        for (key, value) in record.fields() {
            if key == "level" || key == "message" {
                continue;
            }
            let rendered = match value {
                Value::String(s) => escape_value(s),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => "null".to_string(),
                nested => quote_value(&nested.to_string()),
            };
            parts.push(format!("{}={}", escape_key(key), rendered));
        }
        parts.join(" ")
    }
}

impl Format for Logfmt {
    fn transform(&self, mut record: LogRecord) -> Result<Option<LogRecord>> {
        let payload = Self::render(&record);
        record.set_payload(payload);
        Ok(Some(record))
    }

    fn name(&self) -> &str {
        "logfmt"
    }
}

fn escape_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || *c == '.')
        .collect()
}

/// Quote only when the value would otherwise split
fn escape_value(value: &str) -> String {
    if value.is_empty() || value.contains([' ', '"', '=', '\n']) {
        quote_value(value)
    } else {
        value.to_string()
    }
}

fn quote_value(value: &str) -> String {
    format!(
        "\"{}\"",
        value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
    )
}
