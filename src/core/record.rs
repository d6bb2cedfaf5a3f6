//! Log record structure

use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Field flagging a diagnostic record built from an uncaught panic
pub const EXCEPTION_FIELD: &str = "exception";
/// Field flagging a diagnostic record built from an unhandled rejection
pub const REJECTION_FIELD: &str = "rejection";

/// One structured log event.
///
/// All metadata lives flat next to `level` and `message`. Two values are kept
/// out of band so user keys can never collide with them: the level tag used
/// for routing (captured from `level` the first time the engine sees the
/// record) and the serialized payload produced by the format pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogRecord {
    fields: Map<String, Value>,
    level_tag: Option<String>,
    payload: Option<String>,
}

impl LogRecord {
    pub fn new(level: impl Into<String>, message: impl Into<Value>) -> Self {
        let mut fields = Map::new();
        fields.insert("level".to_string(), Value::String(level.into()));
        fields.insert("message".to_string(), message.into());
        Self {
            fields,
            level_tag: None,
            payload: None,
        }
    }

    /// Build a record from an already-flat mapping
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            level_tag: None,
            payload: None,
        }
    }

    /// Record whose message is an error.
    ///
    /// `message` holds the error text and `error` keeps the whole source
    /// chain so nothing is lost when the error is nested.
    pub fn from_error(level: impl Into<String>, err: &(dyn std::error::Error + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(Value::String(cause.to_string()));
            source = cause.source();
        }

        let mut error = Map::new();
        error.insert("message".to_string(), Value::String(err.to_string()));
        if !chain.is_empty() {
            error.insert("causes".to_string(), Value::Array(chain));
        }

        Self::new(level, err.to_string()).with_field("error", Value::Object(error))
    }

    /// Visible level field; formats may rewrite it
    pub fn level(&self) -> Option<&str> {
        self.fields.get("level").and_then(Value::as_str)
    }

    /// Level used for routing: the tag if set, else the visible field
    pub fn routing_level(&self) -> Option<&str> {
        self.level_tag.as_deref().or_else(|| self.level())
    }

    pub(crate) fn tag_level(&mut self) {
        if self.level_tag.is_none() {
            self.level_tag = self.level().map(str::to_string);
        }
    }

    pub fn message(&self) -> Option<&Value> {
        self.fields.get("message")
    }

    /// Message rendered as plain text (strings unquoted)
    pub fn message_text(&self) -> String {
        match self.message() {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Merge metadata at the top level, overwriting existing keys.
    ///
    /// Non-object values carry no keys and are ignored.
    #[must_use]
    pub fn with_meta(mut self, meta: Value) -> Self {
        if let Value::Object(meta) = meta {
            for (key, value) in meta {
                self.fields.insert(key, value);
            }
        }
        self
    }

    /// Insert every key of `defaults` that the record does not already carry
    pub fn merge_defaults(&mut self, defaults: &Map<String, Value>) {
        for (key, value) in defaults {
            if !self.fields.contains_key(key) {
                self.fields.insert(key.clone(), value.clone());
            }
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    /// Everything except `level` and `message`
    pub fn metadata(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter(|(key, _)| key.as_str() != "level" && key.as_str() != "message")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// The serialized payload the format pipeline settled on
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    pub fn set_payload(&mut self, payload: impl Into<String>) {
        self.payload = Some(payload.into());
    }

    pub fn is_flagged(&self, field: &str) -> bool {
        matches!(self.fields.get(field), Some(Value::Bool(true)))
    }

    pub fn is_exception(&self) -> bool {
        self.is_flagged(EXCEPTION_FIELD)
    }

    pub fn is_rejection(&self) -> bool {
        self.is_flagged(REJECTION_FIELD)
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

impl Serialize for LogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl From<Map<String, Value>> for LogRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_fields(fields)
    }
}
