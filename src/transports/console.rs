//! Console transport

use crate::core::error::Result;
use crate::core::record::LogRecord;
use crate::core::transport::{Transport, TransportEvents};
use std::collections::HashSet;
use std::io::Write;

/// Writes each record's payload to stdout, or stderr for selected levels
///
/// Records that reached the transport without a payload are written as JSON.
///
/// # Example
///
/// ```
/// use logfan::transports::ConsoleTransport;
/// use logfan::Logger;
/// use std::sync::Arc;
///
/// let console = ConsoleTransport::new()
///     .with_level("warn")
///     .with_stderr_levels(["error", "warn"]);
///
/// let logger = Logger::new();
/// logger.add(Arc::new(console)).unwrap();
/// logger.close();
/// ```
pub struct ConsoleTransport {
    level: Option<String>,
    stderr_levels: HashSet<String>,
    events: TransportEvents,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self {
            level: None,
            stderr_levels: HashSet::new(),
            events: TransportEvents::new(),
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Levels written to stderr instead of stdout
    #[must_use]
    pub fn with_stderr_levels<I, S>(mut self, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stderr_levels = levels.into_iter().map(Into::into).collect();
        self
    }

    fn line(record: &LogRecord) -> Result<String> {
        match record.payload() {
            Some(payload) => Ok(payload.to_string()),
            None => Ok(serde_json::to_string(record)?),
        }
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ConsoleTransport {
    fn log(&self, record: &LogRecord) -> Result<()> {
        let line = Self::line(record)?;
        let to_stderr = record
            .routing_level()
            .map_or(false, |level| self.stderr_levels.contains(level));

        if to_stderr {
            writeln!(std::io::stderr().lock(), "{}", line)?;
        } else {
            writeln!(std::io::stdout().lock(), "{}", line)?;
        }
        self.events.logged();
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }

    fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }

    fn flush(&self) -> Result<()> {
        // Flush both since we write to both
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn events(&self) -> Option<&TransportEvents> {
        Some(&self.events)
    }
}
