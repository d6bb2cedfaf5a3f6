//! In-memory transport

use crate::core::error::{LoggerError, Result};
use crate::core::record::LogRecord;
use crate::core::transport::{Transport, TransportEvents};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Keeps every delivered record; meant for tests and demos
///
/// # Example
///
/// ```
/// use logfan::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let memory = Arc::new(MemoryTransport::new().with_level("warn"));
/// let logger = Logger::builder().transport(memory.clone()).build().unwrap();
///
/// logger.info("skipped").unwrap();
/// logger.error("kept").unwrap();
///
/// assert!(memory.wait_for(1, Duration::from_secs(1)));
/// assert_eq!(memory.records()[0].message_text(), "kept");
/// ```
pub struct MemoryTransport {
    name: String,
    level: Option<String>,
    handle_exceptions: bool,
    handle_rejections: bool,
    delay: Option<Duration>,
    fail_with: Option<String>,
    records: Mutex<Vec<LogRecord>>,
    arrived: Condvar,
    flushes: AtomicUsize,
    closed: AtomicBool,
    events: TransportEvents,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self {
            name: "memory".to_string(),
            level: None,
            handle_exceptions: false,
            handle_rejections: false,
            delay: None,
            fail_with: None,
            records: Mutex::new(Vec::new()),
            arrived: Condvar::new(),
            flushes: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            events: TransportEvents::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Sleep this long before storing each record
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Reject every record with `message` instead of storing it
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    #[must_use]
    pub fn handling_exceptions(mut self) -> Self {
        self.handle_exceptions = true;
        self
    }

    #[must_use]
    pub fn handling_rejections(mut self) -> Self {
        self.handle_rejections = true;
        self
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Serialized payloads, in delivery order
    pub fn payloads(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter_map(|r| r.payload().map(str::to_string))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block until at least `count` records arrived; `false` on timeout
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut records = self.records.lock();
        while records.len() < count {
            if self.arrived.wait_until(&mut records, deadline).timed_out() {
                return records.len() >= count;
            }
        }
        true
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    fn log(&self, record: &LogRecord) -> Result<()> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if let Some(message) = &self.fail_with {
            return Err(LoggerError::transport(&self.name, message.clone()));
        }

        self.records.lock().push(record.clone());
        self.arrived.notify_all();
        self.events.logged();
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }

    fn handle_exceptions(&self) -> bool {
        self.handle_exceptions
    }

    fn handle_rejections(&self) -> bool {
        self.handle_rejections
    }

    fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn events(&self) -> Option<&TransportEvents> {
        Some(&self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stores_and_waits() {
        let memory = MemoryTransport::new();
        memory.log(&LogRecord::new("info", "a")).unwrap();

        assert!(memory.wait_for(1, Duration::from_millis(10)));
        assert!(!memory.wait_for(2, Duration::from_millis(10)));
        assert_eq!(memory.len(), 1);

        memory.clear();
        assert!(memory.is_empty());
    }

    #[test]
    fn test_failing_reports_error() {
        let memory = MemoryTransport::new().with_name("broken").failing("disk full");
        let err = memory.log(&LogRecord::new("info", "a")).unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert!(memory.is_empty());
    }

    #[test]
    fn test_lifecycle_flags() {
        let memory = MemoryTransport::new();
        memory.flush().unwrap();
        memory.close();
        assert_eq!(memory.flush_count(), 1);
        assert!(memory.is_closed());
    }
}
