//! Transport contracts for log output destinations
//!
//! Two shapes of sink can be attached to a [`Logger`](crate::Logger):
//!
//! - [`Transport`], the push-style contract: the engine hands over a finished
//!   record and the call returns once the sink has dealt with it.
//! - [`LegacyTransport`], the callback-style contract: the sink receives the
//!   level, message and metadata positionally and reports completion through a
//!   callback. These are bridged into the same pipeline.
//!
//! Sinks are shared through `Arc`. The address of that allocation is the sink's
//! identity: attaching the same `Arc` twice attaches the same sink twice.

use super::error::Result;
use super::format::Format;
use super::record::LogRecord;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Push-style log destination
///
/// `log` is called from the binding's own worker thread, one record at a time
/// and in submission order. Use interior mutability for sink state.
pub trait Transport: Send + Sync {
    fn log(&self, record: &LogRecord) -> Result<()>;

    fn name(&self) -> &str {
        "transport"
    }

    /// Threshold for this sink; `None` inherits the logger's
    fn level(&self) -> Option<&str> {
        None
    }

    /// Extra format applied to this sink's copy of every record
    fn format(&self) -> Option<Arc<dyn Format>> {
        None
    }

    /// Accept diagnostic records built from uncaught panics
    fn handle_exceptions(&self) -> bool {
        false
    }

    /// Accept diagnostic records built from unhandled rejections
    fn handle_rejections(&self) -> bool {
        false
    }

    /// Completion signal: called once the binding has drained
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Release resources when the sink is detached
    fn close(&self) {}

    /// Event hub the sink raises `error`/`warn`/`logged` on
    fn events(&self) -> Option<&TransportEvents> {
        None
    }
}

/// Completion callback handed to a [`LegacyTransport`]
pub type LegacyCallback = Box<dyn FnOnce(Result<()>) + Send>;

/// Callback-style log destination
///
/// The sink must eventually invoke `callback` exactly once; the binding waits
/// for it before handing over the next record.
pub trait LegacyTransport: Send + Sync {
    fn log(&self, level: &str, message: &str, meta: &Map<String, Value>, callback: LegacyCallback);

    fn name(&self) -> &str;

    fn level(&self) -> Option<&str> {
        None
    }

    fn close(&self) {}

    fn events(&self) -> Option<&TransportEvents> {
        None
    }
}

/// Something a sink reports about itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Error(String),
    Warn(String),
    Logged,
}

pub type TransportListener = Arc<dyn Fn(&TransportEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listener registry a sink owns and emits its events on
#[derive(Default)]
pub struct TransportEvents {
    listeners: RwLock<Vec<(ListenerId, TransportListener)>>,
    next_id: AtomicU64,
}

impl TransportEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: TransportListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        id
    }

    /// Remove a listener; `false` if it was not registered
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn emit(&self, event: &TransportEvent) {
        let listeners: Vec<TransportListener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(&TransportEvent::Error(message.into()));
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(&TransportEvent::Warn(message.into()));
    }

    pub fn logged(&self) {
        self.emit(&TransportEvent::Logged);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl fmt::Debug for TransportEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportEvents")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Identity of a shared sink instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkId(usize);

/// A sink of either shape, ready to be attached to a logger
///
/// # Examples
///
/// ```
/// use logfan::{Logger, MemoryTransport, Sink};
/// use std::sync::Arc;
///
/// let memory = Arc::new(MemoryTransport::new());
/// let sink = Sink::modern(memory.clone());
///
/// let logger = Logger::new();
/// logger.add(sink.clone()).unwrap();
/// assert_eq!(logger.transport_count(), 1);
///
/// logger.remove(&sink);
/// assert_eq!(logger.transport_count(), 0);
/// ```
#[derive(Clone)]
pub enum Sink {
    Modern(Arc<dyn Transport>),
    Legacy(Arc<dyn LegacyTransport>),
}

impl Sink {
    pub fn modern<T: Transport + 'static>(transport: Arc<T>) -> Self {
        Sink::Modern(transport)
    }

    pub fn legacy<T: LegacyTransport + 'static>(transport: Arc<T>) -> Self {
        Sink::Legacy(transport)
    }

    pub fn id(&self) -> SinkId {
        match self {
            Sink::Modern(t) => SinkId(Arc::as_ptr(t) as *const () as usize),
            Sink::Legacy(t) => SinkId(Arc::as_ptr(t) as *const () as usize),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Sink::Modern(t) => t.name(),
            Sink::Legacy(t) => t.name(),
        }
    }

    pub fn level(&self) -> Option<&str> {
        match self {
            Sink::Modern(t) => t.level(),
            Sink::Legacy(t) => t.level(),
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Sink::Legacy(_))
    }

    pub(crate) fn events(&self) -> Option<&TransportEvents> {
        match self {
            Sink::Modern(t) => t.events(),
            Sink::Legacy(t) => t.events(),
        }
    }

    pub(crate) fn handles_exceptions(&self) -> bool {
        match self {
            Sink::Modern(t) => t.handle_exceptions(),
            Sink::Legacy(_) => false,
        }
    }

    pub(crate) fn handles_rejections(&self) -> bool {
        match self {
            Sink::Modern(t) => t.handle_rejections(),
            Sink::Legacy(_) => false,
        }
    }
}

impl<T: Transport + 'static> From<Arc<T>> for Sink {
    fn from(transport: Arc<T>) -> Self {
        Sink::Modern(transport)
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_legacy() { "Legacy" } else { "Modern" };
        f.debug_struct("Sink")
            .field("kind", &kind)
            .field("name", &self.name())
            .finish()
    }
}
