//! Fan-out engine
//!
//! [`Logger`] owns the level registry, default metadata, the format pipeline
//! and the ordered list of transport bindings. `write` formats a record once on
//! the caller's thread, then queues a copy on every binding that accepts it.

use super::{
    binding::{check_level, Binding, BindingOptions, Delivery, Role, Route},
    child::ChildLogger,
    config::{process_exit, ExitHandler, ExitOnError, LoggerConfig},
    error::{LoggerError, Result},
    events::{EventCallback, EventHub, LoggerEvent, NoticeKind},
    format::Format,
    legacy::{deprecation_notice, LegacyBridge, SharedLevels},
    levels::Levels,
    metrics::LoggerMetrics,
    profiler::{profile_record, Profiler, Timer},
    record::LogRecord,
    shorthand::{LevelHandle, LoggerExt},
    transport::{LegacyTransport, ListenerId, Sink, SinkId, Transport, TransportEvent},
};
use crate::capture::{Capture, Channel};
use crate::formats::Json;
use crossbeam_channel::{bounded, Receiver};
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// How long a dropped (not closed) logger waits for each binding to drain
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Acknowledgement of one binding's delivery of a tracked record
pub(crate) type Ack = (SinkId, Receiver<()>);

/// Structured logger fanning records out to independent transports.
///
/// `Logger` is a cheap handle; clones share the same engine.
///
/// # Example
///
/// ```
/// use logfan::prelude::*;
/// use std::sync::Arc;
///
/// let memory = Arc::new(MemoryTransport::new());
/// let logger = Logger::builder()
///     .level("debug")
///     .default_meta(serde_json::json!({"service": "billing"}))
///     .transport(memory.clone())
///     .build()
///     .unwrap();
///
/// logger.info("charged card").unwrap();
/// logger.close();
///
/// let record = &memory.records()[0];
/// assert_eq!(record.get("service").unwrap(), "billing");
/// ```
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

pub(crate) struct LoggerInner {
    levels: SharedLevels,
    threshold: RwLock<String>,
    format: RwLock<Arc<dyn Format>>,
    default_meta: RwLock<Map<String, Value>>,
    silent: AtomicBool,
    closed: AtomicBool,
    exit_on_error: RwLock<ExitOnError>,
    on_exit: RwLock<ExitHandler>,
    bindings: Mutex<Vec<Binding>>,
    next_order: AtomicU64,
    /// One event forwarder per sink instance, however many bindings it backs
    forwarders: Mutex<HashMap<SinkId, ListenerId>>,
    /// Legacy sinks that already got their deprecation notice; the weak handle
    /// pins the allocation so a later sink can never reuse the address
    bridged: Mutex<Vec<Weak<dyn LegacyTransport>>>,
    profiler: Profiler,
    events: Arc<EventHub>,
    metrics: Arc<LoggerMetrics>,
    exceptions: Capture,
    rejections: Capture,
}

struct Parts {
    levels: Levels,
    level: String,
    format: Arc<dyn Format>,
    default_meta: Map<String, Value>,
    silent: bool,
    exit_on_error: ExitOnError,
    on_exit: ExitHandler,
}

impl Logger {
    /// Logger with npm levels at `info`, JSON format and no transports
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(Parts {
            levels: Levels::npm(),
            level: "info".to_string(),
            format: Arc::new(Json::new()),
            default_meta: Map::new(),
            silent: false,
            exit_on_error: ExitOnError::default(),
            on_exit: process_exit(),
        })
    }

    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    fn from_parts(parts: Parts) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<LoggerInner>| LoggerInner {
            levels: Arc::new(RwLock::new(Arc::new(parts.levels))),
            threshold: RwLock::new(parts.level),
            format: RwLock::new(parts.format),
            default_meta: RwLock::new(parts.default_meta),
            silent: AtomicBool::new(parts.silent),
            closed: AtomicBool::new(false),
            exit_on_error: RwLock::new(parts.exit_on_error),
            on_exit: RwLock::new(parts.on_exit),
            bindings: Mutex::new(Vec::new()),
            next_order: AtomicU64::new(0),
            forwarders: Mutex::new(HashMap::new()),
            bridged: Mutex::new(Vec::new()),
            profiler: Profiler::new(),
            events: Arc::new(EventHub::new()),
            metrics: Arc::new(LoggerMetrics::new()),
            exceptions: Capture::new(Channel::Exception, weak.clone()),
            rejections: Capture::new(Channel::Rejection, weak.clone()),
        });
        Self { inner }
    }

    /// Format `record` and queue it on every accepting binding.
    ///
    /// Returns an error only when the format pipeline fails. Unknown levels,
    /// missing transports and transport failures surface as events.
    pub fn write(&self, record: LogRecord) -> Result<()> {
        self.inner.dispatch(record, false).map(|_| ())
    }

    /// Attach a transport with default options
    pub fn add(&self, sink: impl Into<Sink>) -> Result<()> {
        self.add_with(sink, BindingOptions::default())
    }

    /// Attach a transport with per-binding overrides.
    ///
    /// Legacy transports are wrapped in a bridge; the first time a given legacy
    /// sink is bridged a deprecation notice is raised.
    pub fn add_with(&self, sink: impl Into<Sink>, opts: BindingOptions) -> Result<()> {
        let (exceptions, rejections) = self.inner.attach(sink.into(), opts, Role::Regular)?;
        if exceptions {
            self.inner.exceptions.handle(Vec::<Sink>::new())?;
        }
        if rejections {
            self.inner.rejections.handle(Vec::<Sink>::new())?;
        }
        Ok(())
    }

    /// Detach the first binding of `sink`; `false` if it was not attached.
    ///
    /// Records already queued for that binding are still delivered before the
    /// sink is released.
    ///
    /// Release is not reference-counted: if the same sink also backs another
    /// binding, its `close()` still runs here while that binding keeps
    /// delivering to it.
    pub fn remove(&self, sink: &Sink) -> bool {
        let binding = {
            let mut bindings = self.inner.bindings.lock();
            bindings
                .iter()
                .position(|b| b.role() == Role::Regular && b.id() == sink.id())
                .map(|index| bindings.remove(index))
        };

        match binding {
            Some(binding) => {
                self.inner.release(binding);
                true
            }
            None => false,
        }
    }

    /// Detach every transport added with `add`
    pub fn clear(&self) {
        for binding in self.inner.take_bindings(|role| role == Role::Regular) {
            self.inner.release(binding);
        }
    }

    /// Stop accepting records and wait for every transport to drain.
    ///
    /// Blocks until each bound transport has delivered everything queued and
    /// flushed. Crash handlers are detached afterwards. Calling `close` again
    /// is a no-op.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        for binding in self.inner.take_bindings(|role| role == Role::Regular) {
            self.inner.release(binding);
        }

        self.inner.exceptions.unhandle();
        self.inner.rejections.unhandle();
        for binding in self.inner.take_bindings(|_| true) {
            self.inner.release(binding);
        }

        self.inner.events.emit(&LoggerEvent::Finish);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Derive a logger that adds `meta` to every record it writes.
    ///
    /// The child shares this logger's transports, levels and format. Default
    /// metadata of this logger is read at write time, so later changes show up
    /// in records written through the child.
    pub fn child(&self, meta: Value) -> ChildLogger {
        let meta = match meta {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        ChildLogger::new(self.clone(), meta)
    }

    /// Start or finish the profile `id`.
    ///
    /// The first call records a start time; the second writes an `info` record
    /// with `durationMs` and `message = id`.
    pub fn profile(&self, id: &str) -> Result<()> {
        self.profile_with(id, Value::Null)
    }

    /// Like [`profile`](Self::profile); on finish `meta` is merged into the
    /// record and may override `level` and `message`.
    pub fn profile_with(&self, id: &str, meta: Value) -> Result<()> {
        match self.inner.profiler.finish(id) {
            Some(elapsed) => self.write(profile_record(Some(id), elapsed, meta)),
            None => {
                self.inner.profiler.start(id);
                Ok(())
            }
        }
    }

    /// Start a one-shot timer independent of `profile` ids
    pub fn start_timer(&self) -> Timer {
        Timer::start(ChildLogger::new(self.clone(), Map::new()))
    }

    /// Whether at least one transport would accept a record at `level`.
    ///
    /// With no transports the logger threshold decides. Never writes anything.
    pub fn is_level_enabled(&self, level: &str) -> bool {
        self.inner.is_level_enabled(level)
    }

    /// Logging handle for `level`; `None` when the registry lacks that name
    pub fn level_handle(&self, level: &str) -> Option<LevelHandle> {
        ChildLogger::new(self.clone(), Map::new()).level_handle(level)
    }

    /// One handle per registered level, in registry order
    pub fn level_handles(&self) -> Vec<LevelHandle> {
        let root = ChildLogger::new(self.clone(), Map::new());
        self.levels()
            .names()
            .filter_map(|name| root.level_handle(name))
            .collect()
    }

    pub fn level(&self) -> String {
        self.inner.threshold.read().clone()
    }

    pub fn set_level(&self, level: impl Into<String>) -> Result<()> {
        let level = level.into();
        let levels = self.inner.levels.read();
        if !levels.contains(&level) {
            return Err(LoggerError::config(
                "Logger",
                format!("level '{}' is not defined in levels [{}]", level, levels),
            ));
        }
        *self.inner.threshold.write() = level;
        Ok(())
    }

    pub fn levels(&self) -> Arc<Levels> {
        Arc::clone(&self.inner.levels.read())
    }

    /// Replace the level table wholesale.
    ///
    /// Fails if the current threshold is not part of `levels`; use
    /// [`configure`](Self::configure) to swap both at once.
    pub fn set_levels(&self, levels: Levels) -> Result<()> {
        self.configure(LoggerConfig {
            levels: Some(super::config::LevelsConfig::Table(levels)),
            ..Default::default()
        })
    }

    /// Apply `config` atomically
    pub fn configure(&self, config: LoggerConfig) -> Result<()> {
        {
            let mut levels = self.inner.levels.write();
            let mut threshold = self.inner.threshold.write();
            let (new_levels, new_level) = config.resolve_levels(&levels, &threshold)?;
            *levels = Arc::new(new_levels);
            *threshold = new_level;
        }

        if let Some(silent) = config.silent {
            self.set_silent(silent);
        }
        if let Some(exit) = config.exit_on_error {
            self.set_exit_on_error(exit);
        }
        if let Some(meta) = config.default_meta {
            *self.inner.default_meta.write() = meta;
        }
        Ok(())
    }

    pub fn default_meta(&self) -> Map<String, Value> {
        self.inner.default_meta.read().clone()
    }

    /// Replace default metadata; non-object values clear it
    pub fn set_default_meta(&self, meta: Value) {
        *self.inner.default_meta.write() = match meta {
            Value::Object(map) => map,
            _ => Map::new(),
        };
    }

    pub fn format(&self) -> Arc<dyn Format> {
        Arc::clone(&self.inner.format.read())
    }

    pub fn set_format<F: Format + 'static>(&self, format: F) {
        *self.inner.format.write() = Arc::new(format);
    }

    pub fn is_silent(&self) -> bool {
        self.inner.silent.load(Ordering::Relaxed)
    }

    pub fn set_silent(&self, silent: bool) {
        self.inner.silent.store(silent, Ordering::Relaxed);
    }

    pub fn exit_on_error(&self) -> ExitOnError {
        self.inner.exit_on_error.read().clone()
    }

    pub fn set_exit_on_error(&self, policy: impl Into<ExitOnError>) {
        *self.inner.exit_on_error.write() = policy.into();
    }

    /// Replace the process terminator used by crash capture
    pub fn set_exit_handler(&self, handler: ExitHandler) {
        *self.inner.on_exit.write() = handler;
    }

    /// Subscribe to transport errors, warnings and operational notices.
    ///
    /// Once any callback is registered, notices stop going to stderr.
    pub fn on_event(&self, callback: EventCallback) {
        self.inner.events.subscribe(callback);
    }

    /// Capture of uncaught panics bound to this logger
    pub fn exceptions(&self) -> &Capture {
        &self.inner.exceptions
    }

    /// Capture of unhandled rejections bound to this logger
    pub fn rejections(&self) -> &Capture {
        &self.inner.rejections
    }

    /// Number of transports attached with `add`
    pub fn transport_count(&self) -> usize {
        self.inner
            .bindings
            .lock()
            .iter()
            .filter(|b| b.role() == Role::Regular)
            .count()
    }

    /// Names of transports attached with `add`, in attachment order
    pub fn transport_names(&self) -> Vec<String> {
        let bindings = self.inner.bindings.lock();
        let mut regular: Vec<&Binding> = bindings
            .iter()
            .filter(|b| b.role() == Role::Regular)
            .collect();
        regular.sort_by_key(|b| b.order);
        regular.iter().map(|b| b.sink.name().to_string()).collect()
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.inner.metrics
    }

    pub(crate) fn profiler(&self) -> &Profiler {
        &self.inner.profiler
    }
}

impl LoggerExt for Logger {
    fn write(&self, record: LogRecord) -> Result<()> {
        Logger::write(self, record)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("transports", &self.transport_names())
            .field("silent", &self.is_silent())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl LoggerInner {
    /// Write path shared by `Logger::write` and crash capture.
    ///
    /// With `track` set, returns one acknowledgement per queued delivery.
    pub(crate) fn dispatch(&self, mut record: LogRecord, track: bool) -> Result<Vec<Ack>> {
        if self.silent.load(Ordering::Relaxed) {
            self.metrics.record_dropped();
            return Ok(Vec::new());
        }
        if self.closed.load(Ordering::Acquire) {
            self.metrics.record_dropped();
            self.events.notice(
                NoticeKind::WriteAfterClose,
                format!("Attempt to write to a closed logger: {}", summary(&record)),
            );
            return Ok(Vec::new());
        }

        record.merge_defaults(&self.default_meta.read());
        record.tag_level();

        let levels = Arc::clone(&self.levels.read());
        match record.routing_level() {
            Some(level) if levels.contains(level) => {}
            Some(level) => self.events.notice(
                NoticeKind::UnknownLevel,
                format!("Unknown logger level: {}", level),
            ),
            None => self.events.notice(
                NoticeKind::UnknownLevel,
                format!("Record has no level: {}", summary(&record)),
            ),
        }

        let routes: Vec<Route> = self
            .bindings
            .lock()
            .iter()
            .map(|b| b.route().clone())
            .collect();
        if routes.is_empty() {
            self.metrics.record_dropped();
            self.events.notice(
                NoticeKind::NoTransports,
                format!(
                    "Attempt to write logs with no transports, which can increase memory usage: {}",
                    summary(&record)
                ),
            );
            return Ok(Vec::new());
        }

        let format = Arc::clone(&self.format.read());
        let Some(record) = format.transform(record)? else {
            self.metrics.record_dropped();
            return Ok(Vec::new());
        };
        self.metrics.record_written();

        let threshold = self.threshold.read().clone();
        let mut outgoing = Vec::with_capacity(routes.len());
        for route in routes {
            if !route.accepts(&record, &levels, &threshold) {
                continue;
            }
            let copy = match &route.format {
                Some(format) => match format.transform(record.clone())? {
                    Some(copy) => copy,
                    None => continue,
                },
                None => record.clone(),
            };
            outgoing.push((route, copy));
        }

        let mut acks = Vec::new();
        for (route, record) in outgoing {
            let ack = if track {
                let (ack, acked) = bounded(1);
                acks.push((route.id, acked));
                Some(ack)
            } else {
                None
            };
            // a binding detached mid-write drops its receiver; the ack then disconnects
            let _ = route.sender.send(Delivery { record, ack });
        }
        Ok(acks)
    }

    /// Create and register a binding; reports whether it opted into crash records
    pub(crate) fn attach(&self, sink: Sink, opts: BindingOptions, role: Role) -> Result<(bool, bool)> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LoggerError::config(
                "Logger",
                format!("cannot add transport '{}' to a closed logger", sink.name()),
            ));
        }
        check_level(&self.levels.read(), &opts)?;

        let delivery: Arc<dyn Transport> = match &sink {
            Sink::Modern(transport) => Arc::clone(transport),
            Sink::Legacy(transport) => {
                if self.first_bridge(transport) {
                    self.events
                        .notice(NoticeKind::Deprecation, deprecation_notice(sink.name()));
                }
                Arc::new(LegacyBridge::new(
                    Arc::clone(transport),
                    Arc::clone(&self.levels),
                ))
            }
        };

        let binding = Binding::spawn(
            sink.clone(),
            delivery,
            opts,
            role,
            self.next_order.fetch_add(1, Ordering::Relaxed),
            Arc::clone(&self.events),
            Arc::clone(&self.metrics),
        )?;
        let opted_in = (
            role == Role::Regular && binding.handles_exceptions(),
            role == Role::Regular && binding.handles_rejections(),
        );

        self.forward_events(&sink);
        self.bindings.lock().push(binding);
        Ok(opted_in)
    }

    /// Remember `transport` as bridged; `false` if this instance was seen before
    fn first_bridge(&self, transport: &Arc<dyn LegacyTransport>) -> bool {
        let mut bridged = self.bridged.lock();
        bridged.retain(|seen| seen.strong_count() > 0);

        let weak = Arc::downgrade(transport);
        if bridged.iter().any(|seen| seen.ptr_eq(&weak)) {
            return false;
        }
        bridged.push(weak);
        true
    }

    /// Subscribe the engine to `sink`'s events unless already subscribed
    fn forward_events(&self, sink: &Sink) {
        let Some(events) = sink.events() else {
            return;
        };
        let mut forwarders = self.forwarders.lock();
        if forwarders.contains_key(&sink.id()) {
            return;
        }

        let hub = Arc::downgrade(&self.events);
        let name = sink.name().to_string();
        let id = events.subscribe(Arc::new(move |event: &TransportEvent| {
            let Some(hub) = hub.upgrade() else {
                return;
            };
            match event {
                TransportEvent::Error(message) => hub.transport_error(&name, message.clone()),
                TransportEvent::Warn(message) => hub.transport_warn(&name, message.clone()),
                TransportEvent::Logged => {}
            }
        }));
        forwarders.insert(sink.id(), id);
    }

    /// Drain and release a binding already removed from the list.
    ///
    /// The sink is closed even if another binding still uses it. The event
    /// forwarder goes only once no binding references the sink.
    fn release(&self, binding: Binding) {
        let sink = binding.detach();
        let still_bound = self.bindings.lock().iter().any(|b| b.id() == sink.id());
        if still_bound {
            return;
        }
        if let Some(id) = self.forwarders.lock().remove(&sink.id()) {
            if let Some(events) = sink.events() {
                events.unsubscribe(id);
            }
        }
    }

    fn take_bindings(&self, select: impl Fn(Role) -> bool) -> Vec<Binding> {
        let mut bindings = self.bindings.lock();
        let (taken, kept): (Vec<Binding>, Vec<Binding>) =
            bindings.drain(..).partition(|b| select(b.role()));
        *bindings = kept;
        taken
    }

    pub(crate) fn is_level_enabled(&self, level: &str) -> bool {
        let levels = Arc::clone(&self.levels.read());
        let threshold = self.threshold.read().clone();
        let bindings = self.bindings.lock();
        levels.is_enabled_for(
            level,
            &threshold,
            bindings
                .iter()
                .filter(|b| b.role() == Role::Regular)
                .map(|b| b.level()),
        )
    }

    /// Sinks still bound to receive records of `channel`: the dedicated
    /// handlers plus regular bindings that opted in
    pub(crate) fn crash_handlers(&self, channel: Channel) -> Vec<SinkId> {
        let mut handlers: Vec<SinkId> = Vec::new();
        for binding in self.bindings.lock().iter() {
            let handles = match (binding.role(), channel) {
                (Role::Exceptions, Channel::Exception) => true,
                (Role::Rejections, Channel::Rejection) => true,
                (Role::Regular, Channel::Exception) => binding.handles_exceptions(),
                (Role::Regular, Channel::Rejection) => binding.handles_rejections(),
                _ => false,
            };
            if handles && !handlers.contains(&binding.id()) {
                handlers.push(binding.id());
            }
        }
        handlers
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn events(&self) -> &EventHub {
        &self.events
    }

    pub(crate) fn should_exit(&self, err: &crate::capture::FatalError) -> bool {
        self.exit_on_error.read().resolve(err)
    }

    pub(crate) fn exit(&self, code: i32) {
        let handler = Arc::clone(&self.on_exit.read());
        handler(code);
    }
}

impl Drop for LoggerInner {
    fn drop(&mut self) {
        if *self.closed.get_mut() {
            return;
        }

        // Drain without releasing sinks; they may be shared elsewhere
        for binding in std::mem::take(self.bindings.get_mut()) {
            binding.abandon(DEFAULT_SHUTDOWN_TIMEOUT);
        }

        let failures = self.metrics.transport_failures();
        if failures > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shutting down with {} failed deliveries (failure rate: {:.2}%)",
                failures,
                self.metrics.failure_rate()
            );
        }
    }
}

fn summary(record: &LogRecord) -> String {
    serde_json::to_string(record).unwrap_or_default()
}

/// Builder for constructing a [`Logger`] with a fluent API
///
/// # Example
/// ```
/// use logfan::prelude::*;
/// use std::sync::Arc;
///
/// let logger = Logger::builder()
///     .levels(Levels::syslog())
///     .level("notice")
///     .format(logfan::formats::Logfmt::new())
///     .transport(Arc::new(MemoryTransport::new()))
///     .exit_on_error(false)
///     .on_event(Arc::new(|event: &LoggerEvent| eprintln!("{:?}", event)))
///     .build()
///     .unwrap();
///
/// assert!(logger.is_level_enabled("warning"));
/// assert!(!logger.is_level_enabled("info"));
/// ```
pub struct LoggerBuilder {
    levels: Levels,
    level: String,
    format: Arc<dyn Format>,
    default_meta: Map<String, Value>,
    silent: bool,
    exit_on_error: ExitOnError,
    on_exit: ExitHandler,
    transports: Vec<(Sink, BindingOptions)>,
    exception_handlers: Vec<Sink>,
    rejection_handlers: Vec<Sink>,
    handle_exceptions: bool,
    handle_rejections: bool,
    callbacks: Vec<EventCallback>,
    config: Option<LoggerConfig>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            levels: Levels::npm(),
            level: "info".to_string(),
            format: Arc::new(Json::new()),
            default_meta: Map::new(),
            silent: false,
            exit_on_error: ExitOnError::default(),
            on_exit: process_exit(),
            transports: Vec::new(),
            exception_handlers: Vec::new(),
            rejection_handlers: Vec::new(),
            handle_exceptions: false,
            handle_rejections: false,
            callbacks: Vec::new(),
            config: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn levels(mut self, levels: Levels) -> Self {
        self.levels = levels;
        self
    }

    /// Set the threshold level name
    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn format<F: Format + 'static>(mut self, format: F) -> Self {
        self.format = Arc::new(format);
        self
    }

    /// Metadata merged into every record; non-object values are ignored
    #[must_use = "builder methods return a new value"]
    pub fn default_meta(mut self, meta: Value) -> Self {
        if let Value::Object(map) = meta {
            self.default_meta = map;
        }
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn exit_on_error(mut self, exit: bool) -> Self {
        self.exit_on_error = ExitOnError::Always(exit);
        self
    }

    /// Decide per fatal error whether the process exits
    #[must_use = "builder methods return a new value"]
    pub fn exit_when<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&crate::capture::FatalError) -> bool + Send + Sync + 'static,
    {
        self.exit_on_error = ExitOnError::When(Arc::new(predicate));
        self
    }

    /// Replace `std::process::exit` as the crash-capture terminator
    #[must_use = "builder methods return a new value"]
    pub fn on_exit<H>(mut self, handler: H) -> Self
    where
        H: Fn(i32) + Send + Sync + 'static,
    {
        self.on_exit = Arc::new(handler);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn transport(self, sink: impl Into<Sink>) -> Self {
        self.transport_with(sink, BindingOptions::default())
    }

    #[must_use = "builder methods return a new value"]
    pub fn transport_with(mut self, sink: impl Into<Sink>, opts: BindingOptions) -> Self {
        self.transports.push((sink.into(), opts));
        self
    }

    /// Dedicated sink for uncaught panics; arms panic capture
    #[must_use = "builder methods return a new value"]
    pub fn exception_handler(mut self, sink: impl Into<Sink>) -> Self {
        self.exception_handlers.push(sink.into());
        self
    }

    /// Dedicated sink for unhandled rejections; arms rejection capture
    #[must_use = "builder methods return a new value"]
    pub fn rejection_handler(mut self, sink: impl Into<Sink>) -> Self {
        self.rejection_handlers.push(sink.into());
        self
    }

    /// Arm panic capture even without dedicated handlers
    #[must_use = "builder methods return a new value"]
    pub fn handle_exceptions(mut self) -> Self {
        self.handle_exceptions = true;
        self
    }

    /// Arm rejection capture even without dedicated handlers
    #[must_use = "builder methods return a new value"]
    pub fn handle_rejections(mut self) -> Self {
        self.handle_rejections = true;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn on_event(mut self, callback: EventCallback) -> Self {
        self.callbacks.push(callback);
        self
    }

    /// Apply a [`LoggerConfig`] on top of the other settings
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the Logger
    ///
    /// Fails when the threshold is not a registered level or a transport is
    /// rejected.
    pub fn build(mut self) -> Result<Logger> {
        if let Some(config) = self.config.take() {
            let (levels, level) = config.resolve_levels(&self.levels, &self.level)?;
            self.levels = levels;
            self.level = level;
            if let Some(silent) = config.silent {
                self.silent = silent;
            }
            if let Some(exit) = config.exit_on_error {
                self.exit_on_error = ExitOnError::Always(exit);
            }
            if let Some(meta) = config.default_meta {
                self.default_meta = meta;
            }
        }

        if !self.levels.contains(&self.level) {
            return Err(LoggerError::config(
                "Logger",
                format!("level '{}' is not defined in levels [{}]", self.level, self.levels),
            ));
        }

        let logger = Logger::from_parts(Parts {
            levels: self.levels,
            level: self.level,
            format: self.format,
            default_meta: self.default_meta,
            silent: self.silent,
            exit_on_error: self.exit_on_error,
            on_exit: self.on_exit,
        });

        for callback in self.callbacks {
            logger.on_event(callback);
        }
        for (sink, opts) in self.transports {
            logger.add_with(sink, opts)?;
        }
        if self.handle_exceptions || !self.exception_handlers.is_empty() {
            logger.exceptions().handle(self.exception_handlers)?;
        }
        if self.handle_rejections || !self.rejection_handlers.is_empty() {
            logger.rejections().handle(self.rejection_handlers)?;
        }

        Ok(logger)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
