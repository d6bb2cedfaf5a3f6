//! Duration profiling: id-keyed profiles and one-shot timers

use super::child::ChildLogger;
use super::error::Result;
use super::record::LogRecord;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Start times of running `profile(id)` calls
#[derive(Debug, Default)]
pub(crate) struct Profiler {
    started: Mutex<HashMap<String, Instant>>,
}

impl Profiler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn start(&self, id: &str) {
        self.started.lock().insert(id.to_string(), Instant::now());
    }

    /// Elapsed time of a running profile; `None` if `id` was not started
    pub(crate) fn finish(&self, id: &str) -> Option<Duration> {
        self.started
            .lock()
            .remove(id)
            .map(|start| start.elapsed())
    }

    #[cfg(test)]
    pub(crate) fn running(&self) -> usize {
        self.started.lock().len()
    }
}

/// Record written when a profile or timer completes.
///
/// `meta` may override `level` and `message`; `durationMs` always reflects the
/// measurement.
pub(crate) fn profile_record(message: Option<&str>, elapsed: Duration, meta: Value) -> LogRecord {
    let mut record = LogRecord::from_fields(Default::default()).with_meta(meta);
    if !record.contains("level") {
        record.insert("level", "info");
    }
    if !record.contains("message") {
        if let Some(message) = message {
            record.insert("message", message);
        }
    }
    record.insert("durationMs", elapsed.as_millis() as u64);
    record
}

/// Handle returned by `start_timer`; completing it consumes it.
///
/// # Example
///
/// ```
/// use logfan::prelude::*;
/// use std::sync::Arc;
///
/// let memory = Arc::new(MemoryTransport::new());
/// let logger = Logger::builder().transport(memory.clone()).build().unwrap();
///
/// let timer = logger.start_timer();
/// timer.done("import finished").unwrap();
/// logger.close();
///
/// assert!(memory.records()[0].contains("durationMs"));
/// ```
#[must_use = "a timer only writes a record when completed"]
pub struct Timer {
    target: ChildLogger,
    start: Instant,
}

impl Timer {
    pub(crate) fn start(target: ChildLogger) -> Self {
        Self {
            target,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Write an `info` record with `durationMs` and `message`
    pub fn done(self, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        let record = profile_record(Some(&message), self.start.elapsed(), Value::Null);
        self.target.write(record)
    }

    /// Write the duration record with `meta` merged in
    pub fn done_with(self, meta: Value) -> Result<()> {
        let record = profile_record(None, self.start.elapsed(), meta);
        self.target.write(record)
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer").field("elapsed", &self.elapsed()).finish()
    }
}
