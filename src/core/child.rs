//! Child loggers
//!
//! A child holds a handle to its parent and nothing else but extra metadata.
//! Transports, levels, format and the parent's default metadata are all read
//! through the parent when a record is written.

use super::error::Result;
use super::logger::Logger;
use super::profiler::{profile_record, Timer};
use super::record::LogRecord;
use super::shorthand::{LevelHandle, LoggerExt};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Logger view that adds fixed metadata to every record
///
/// Precedence on key conflicts: record fields, then the child's metadata, then
/// the parent's default metadata.
///
/// # Example
///
/// ```
/// use logfan::prelude::*;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let memory = Arc::new(MemoryTransport::new());
/// let logger = Logger::builder()
///     .default_meta(json!({"service": "auth"}))
///     .transport(memory.clone())
///     .build()
///     .unwrap();
///
/// let request = logger.child(json!({"requestId": "42"}));
/// request.info("hi").unwrap();
/// logger.close();
///
/// let record = &memory.records()[0];
/// assert_eq!(record.get("service").unwrap(), "auth");
/// assert_eq!(record.get("requestId").unwrap(), "42");
/// ```
#[derive(Clone)]
pub struct ChildLogger {
    parent: Logger,
    meta: Arc<Map<String, Value>>,
}

impl ChildLogger {
    pub(crate) fn new(parent: Logger, meta: Map<String, Value>) -> Self {
        Self {
            parent,
            meta: Arc::new(meta),
        }
    }

    pub fn write(&self, mut record: LogRecord) -> Result<()> {
        record.merge_defaults(&self.meta);
        self.parent.write(record)
    }

    /// Derive a grandchild; keys in `meta` win over this child's
    pub fn child(&self, meta: Value) -> ChildLogger {
        let mut merged = (*self.meta).clone();
        if let Value::Object(extra) = meta {
            merged.extend(extra);
        }
        ChildLogger::new(self.parent.clone(), merged)
    }

    pub fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }

    pub fn parent(&self) -> &Logger {
        &self.parent
    }

    /// Shares the parent's profile table; the finishing record carries this
    /// child's metadata
    pub fn profile(&self, id: &str) -> Result<()> {
        self.profile_with(id, Value::Null)
    }

    pub fn profile_with(&self, id: &str, meta: Value) -> Result<()> {
        match self.parent.profiler().finish(id) {
            Some(elapsed) => self.write(profile_record(Some(id), elapsed, meta)),
            None => {
                self.parent.profiler().start(id);
                Ok(())
            }
        }
    }

    pub fn start_timer(&self) -> Timer {
        Timer::start(self.clone())
    }

    pub fn is_level_enabled(&self, level: &str) -> bool {
        self.parent.is_level_enabled(level)
    }

    pub fn level_handle(&self, level: &str) -> Option<LevelHandle> {
        if self.parent.levels().contains(level) {
            Some(LevelHandle::new(self.clone(), level))
        } else {
            None
        }
    }
}

impl LoggerExt for ChildLogger {
    fn write(&self, record: LogRecord) -> Result<()> {
        ChildLogger::write(self, record)
    }
}

impl std::fmt::Debug for ChildLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildLogger")
            .field("meta", &self.meta)
            .field("parent", &self.parent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transports::MemoryTransport;
    use serde_json::json;

    fn logger_with_memory() -> (Logger, Arc<MemoryTransport>) {
        let memory = Arc::new(MemoryTransport::new());
        let logger = Logger::builder()
            .level("silly")
            .default_meta(json!({"service": "auth"}))
            .transport(memory.clone())
            .build()
            .unwrap();
        (logger, memory)
    }

    #[test]
    fn test_record_fields_win_over_child_meta() {
        let (logger, memory) = logger_with_memory();
        let child = logger.child(json!({"requestId": "42"}));

        child
            .write(LogRecord::new("info", "hi").with_field("requestId", "override"))
            .unwrap();
        logger.close();

        let record = &memory.records()[0];
        assert_eq!(record.get("requestId"), Some(&json!("override")));
        assert_eq!(record.get("service"), Some(&json!("auth")));
    }

    #[test]
    fn test_child_meta_wins_over_parent_default() {
        let (logger, memory) = logger_with_memory();
        logger.child(json!({"service": "edge"})).info("x").unwrap();
        logger.close();
        assert_eq!(memory.records()[0].get("service"), Some(&json!("edge")));
    }

    #[test]
    fn test_parent_meta_resolved_at_write_time() {
        let (logger, memory) = logger_with_memory();
        let child = logger.child(json!({"requestId": "1"}));

        logger.set_default_meta(json!({"service": "billing"}));
        child.info("after").unwrap();
        logger.close();

        assert_eq!(memory.records()[0].get("service"), Some(&json!("billing")));
    }

    #[test]
    fn test_grandchild_merges_meta() {
        let (logger, memory) = logger_with_memory();
        let grandchild = logger
            .child(json!({"a": 1, "b": 1}))
            .child(json!({"b": 2}));
        grandchild.debug("deep").unwrap();
        logger.close();

        let record = &memory.records()[0];
        assert_eq!(record.get("a"), Some(&json!(1)));
        assert_eq!(record.get("b"), Some(&json!(2)));
    }

    #[test]
    fn test_child_profile_carries_child_meta() {
        let (logger, memory) = logger_with_memory();
        let child = logger.child(json!({"job": "sync"}));

        child.profile("load").unwrap();
        child.profile("load").unwrap();
        logger.close();

        let record = &memory.records()[0];
        assert_eq!(record.message_text(), "load");
        assert_eq!(record.get("job"), Some(&json!("sync")));
        assert!(record.contains("durationMs"));
    }
}
