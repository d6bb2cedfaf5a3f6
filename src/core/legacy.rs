//! Bridge from callback-style transports into the push pipeline

use super::error::{LoggerError, Result};
use super::levels::Levels;
use super::record::LogRecord;
use super::transport::{LegacyTransport, Transport, TransportEvents};
use crossbeam_channel::bounded;
use parking_lot::RwLock;
use std::sync::Arc;

/// Level table shared between a logger and the bridges it creates
pub(crate) type SharedLevels = Arc<RwLock<Arc<Levels>>>;

/// Presents a [`LegacyTransport`] as a [`Transport`].
///
/// Delivery blocks the binding's worker until the legacy callback fires, so
/// per-binding ordering holds for legacy sinks too.
pub(crate) struct LegacyBridge {
    transport: Arc<dyn LegacyTransport>,
    levels: SharedLevels,
}

impl LegacyBridge {
    pub(crate) fn new(transport: Arc<dyn LegacyTransport>, levels: SharedLevels) -> Self {
        Self { transport, levels }
    }

    /// The sink's own threshold, checked against the live registry
    fn rejects(&self, record: &LogRecord) -> bool {
        let Some(own) = self.transport.level() else {
            return false;
        };
        let Some(level) = record.routing_level() else {
            return false;
        };
        !self.levels.read().accepts(own, level)
    }
}

impl Transport for LegacyBridge {
    fn log(&self, record: &LogRecord) -> Result<()> {
        if self.rejects(record) {
            return Ok(());
        }

        let level = record.routing_level().unwrap_or_default();
        let message = record.message_text();
        let meta = record.metadata();

        let (done, finished) = bounded(1);
        self.transport.log(
            level,
            &message,
            &meta,
            Box::new(move |outcome| {
                let _ = done.send(outcome);
            }),
        );

        match finished.recv() {
            Ok(outcome) => outcome,
            Err(_) => Err(LoggerError::transport(
                self.transport.name(),
                "callback dropped without being called",
            )),
        }
    }

    fn name(&self) -> &str {
        self.transport.name()
    }

    fn level(&self) -> Option<&str> {
        self.transport.level()
    }

    fn close(&self) {
        self.transport.close();
    }

    fn events(&self) -> Option<&TransportEvents> {
        self.transport.events()
    }
}

/// Text of the one-time notice raised when a legacy sink is first bridged
pub(crate) fn deprecation_notice(name: &str) -> String {
    format!(
        "{} is a legacy transport that takes (level, message, meta, callback). \
         Consider upgrading it to the Transport trait.",
        name
    )
}
