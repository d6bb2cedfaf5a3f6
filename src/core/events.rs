//! Engine-level events and operational notices

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Callback invoked for every [`LoggerEvent`].
///
/// Called from whichever thread raised the event, including binding workers.
pub type EventCallback = Arc<dyn Fn(&LoggerEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    /// A record used a level name the registry does not contain
    UnknownLevel,
    /// A record was written while no transport was attached
    NoTransports,
    /// A callback-style transport was bridged
    Deprecation,
    /// Exit was requested with no handler to record the crash
    ExitDowngraded,
    /// Handlers did not acknowledge the crash record in time
    CaptureTimeout,
    /// A handler's worker was gone and the crash record never reached it
    CaptureLost,
    /// A record was written after `close()`
    WriteAfterClose,
}

/// Operational warning: never an error, always worth surfacing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggerEvent {
    /// A bound transport failed; tagged with the transport's name
    TransportError { transport: String, message: String },
    /// A bound transport raised a warning
    TransportWarn { transport: String, message: String },
    Notice(Notice),
    /// `close()` drained every binding
    Finish,
}

/// Fan-out point for engine events, shared with binding workers
#[derive(Default)]
pub(crate) struct EventHub {
    callbacks: RwLock<Vec<EventCallback>>,
}

impl EventHub {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn subscribe(&self, callback: EventCallback) {
        self.callbacks.write().push(callback);
    }

    pub(crate) fn emit(&self, event: &LoggerEvent) {
        let callbacks = self.callbacks.read().clone();
        for callback in callbacks.iter() {
            callback(event);
        }
    }

    /// Deliver a notice; falls back to stderr when nobody listens
    pub(crate) fn notice(&self, kind: NoticeKind, message: impl Into<String>) {
        let notice = Notice {
            kind,
            message: message.into(),
        };

        if self.callbacks.read().is_empty() {
            eprintln!("[LOGGER WARNING] {}", notice.message);
            return;
        }
        self.emit(&LoggerEvent::Notice(notice));
    }

    pub(crate) fn transport_warn(&self, transport: &str, message: impl Into<String>) {
        let message = message.into();
        if self.callbacks.read().is_empty() {
            eprintln!("[LOGGER WARNING] Transport '{}': {}", transport, message);
            return;
        }
        self.emit(&LoggerEvent::TransportWarn {
            transport: transport.to_string(),
            message,
        });
    }

    pub(crate) fn transport_error(&self, transport: &str, message: impl Into<String>) {
        let message = message.into();
        if self.callbacks.read().is_empty() {
            eprintln!("[LOGGER ERROR] Transport '{}' failed: {}", transport, message);
            return;
        }
        self.emit(&LoggerEvent::TransportError {
            transport: transport.to_string(),
            message,
        });
    }
}
