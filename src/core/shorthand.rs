//! Level-named entry points
//!
//! The level table is data, so per-level methods cannot be generated from it.
//! Instead every logger gets one `log(level, ..)` entry point, typed wrappers
//! for the default npm names, and [`LevelHandle`]s for any registered name.

use super::child::ChildLogger;
use super::error::Result;
use super::record::LogRecord;
use serde_json::Value;

/// Logging entry points shared by [`Logger`](crate::Logger) and
/// [`ChildLogger`].
///
/// Only `write` is required.
pub trait LoggerExt {
    fn write(&self, record: LogRecord) -> Result<()>;

    fn log(&self, level: &str, message: impl Into<Value>) -> Result<()>
    where
        Self: Sized,
    {
        self.write(LogRecord::new(level, message))
    }

    /// Log with metadata merged at the top level.
    ///
    /// `level` and `message` always win over keys of the same name in `meta`,
    /// except that a string `meta.message` is appended to the message.
    fn log_with(&self, level: &str, message: impl Into<Value>, meta: Value) -> Result<()>
    where
        Self: Sized,
    {
        let mut record = LogRecord::new(level, message);
        if let Value::Object(mut meta) = meta {
            meta.remove("level");
            if let Some(Value::String(extra)) = meta.remove("message") {
                let joined = format!("{} {}", record.message_text(), extra);
                record.insert("message", joined);
            }
            record = record.with_meta(Value::Object(meta));
        }
        self.write(record)
    }

    /// Log an error value, keeping its source chain under `error`
    fn log_error(&self, level: &str, err: &(dyn std::error::Error + 'static)) -> Result<()>
    where
        Self: Sized,
    {
        self.write(LogRecord::from_error(level, err))
    }

    fn error(&self, message: impl Into<Value>) -> Result<()>
    where
        Self: Sized,
    {
        self.log("error", message)
    }

    fn warn(&self, message: impl Into<Value>) -> Result<()>
    where
        Self: Sized,
    {
        self.log("warn", message)
    }

    fn info(&self, message: impl Into<Value>) -> Result<()>
    where
        Self: Sized,
    {
        self.log("info", message)
    }

    fn http(&self, message: impl Into<Value>) -> Result<()>
    where
        Self: Sized,
    {
        self.log("http", message)
    }

    fn verbose(&self, message: impl Into<Value>) -> Result<()>
    where
        Self: Sized,
    {
        self.log("verbose", message)
    }

    fn debug(&self, message: impl Into<Value>) -> Result<()>
    where
        Self: Sized,
    {
        self.log("debug", message)
    }

    fn silly(&self, message: impl Into<Value>) -> Result<()>
    where
        Self: Sized,
    {
        self.log("silly", message)
    }
}

/// Logging capability for one registered level name
///
/// # Example
///
/// ```
/// use logfan::prelude::*;
/// use std::sync::Arc;
///
/// let memory = Arc::new(MemoryTransport::new());
/// let logger = Logger::builder()
///     .levels(Levels::syslog())
///     .level("debug")
///     .transport(memory.clone())
///     .build()
///     .unwrap();
///
/// let notice = logger.level_handle("notice").unwrap();
/// assert!(notice.is_enabled());
/// notice.log("disk at 80%").unwrap();
///
/// assert!(logger.level_handle("http").is_none());
/// logger.close();
/// assert_eq!(memory.records()[0].level(), Some("notice"));
/// ```
#[derive(Debug, Clone)]
pub struct LevelHandle {
    target: ChildLogger,
    level: String,
}

impl LevelHandle {
    pub(crate) fn new(target: ChildLogger, level: impl Into<String>) -> Self {
        Self {
            target,
            level: level.into(),
        }
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn log(&self, message: impl Into<Value>) -> Result<()> {
        self.target.log(&self.level, message)
    }

    pub fn log_with(&self, message: impl Into<Value>, meta: Value) -> Result<()> {
        self.target.log_with(&self.level, message, meta)
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_level_enabled(&self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct Collect(Mutex<Vec<LogRecord>>);

    impl LoggerExt for Collect {
        fn write(&self, record: LogRecord) -> Result<()> {
            self.0.lock().push(record);
            Ok(())
        }
    }

    #[test]
    fn test_shorthand_sets_level() {
        let sink = Collect::default();
        sink.warn("careful").unwrap();
        sink.silly("noise").unwrap();

        let records = sink.0.lock();
        assert_eq!(records[0].level(), Some("warn"));
        assert_eq!(records[1].level(), Some("silly"));
    }

    #[test]
    fn test_log_with_explicit_level_wins() {
        let sink = Collect::default();
        sink.log_with("info", "hello", json!({"level": "error", "user": "ada"}))
            .unwrap();

        let record = &sink.0.lock()[0];
        assert_eq!(record.level(), Some("info"));
        assert_eq!(record.get("user"), Some(&json!("ada")));
    }

    #[test]
    fn test_log_with_appends_meta_message() {
        let sink = Collect::default();
        sink.log_with("info", "hello", json!({"message": "world"}))
            .unwrap();
        assert_eq!(sink.0.lock()[0].message_text(), "hello world");
    }

    #[test]
    fn test_log_error_keeps_text() {
        let sink = Collect::default();
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "no config");
        sink.log_error("error", &err).unwrap();
        assert_eq!(sink.0.lock()[0].message_text(), "no config");
    }
}
