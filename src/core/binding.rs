//! Transport bindings: one sink attached to one logger
//!
//! Every binding owns an unbounded queue and a worker thread draining it in
//! FIFO order, so a slow or failing sink only ever holds up its own records.

use super::error::{LoggerError, Result};
use super::events::EventHub;
use super::format::Format;
use super::levels::Levels;
use super::metrics::LoggerMetrics;
use super::record::LogRecord;
use super::transport::{Sink, SinkId, Transport};
use crate::capture::hook;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Per-binding overrides given to [`Logger::add_with`](crate::Logger::add_with)
///
/// # Examples
///
/// ```
/// use logfan::formats::Simple;
/// use logfan::BindingOptions;
///
/// let opts = BindingOptions::new()
///     .level("error")
///     .format(Simple::new())
///     .handle_exceptions(true);
/// assert_eq!(opts.level.as_deref(), Some("error"));
/// ```
#[derive(Clone, Default)]
pub struct BindingOptions {
    pub level: Option<String>,
    pub format: Option<Arc<dyn Format>>,
    pub handle_exceptions: bool,
    pub handle_rejections: bool,
}

impl BindingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    #[must_use]
    pub fn format<F: Format + 'static>(mut self, format: F) -> Self {
        self.format = Some(Arc::new(format));
        self
    }

    #[must_use]
    pub fn handle_exceptions(mut self, enabled: bool) -> Self {
        self.handle_exceptions = enabled;
        self
    }

    #[must_use]
    pub fn handle_rejections(mut self, enabled: bool) -> Self {
        self.handle_rejections = enabled;
        self
    }
}

impl std::fmt::Debug for BindingOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingOptions")
            .field("level", &self.level)
            .field("format", &self.format.as_ref().map(|format| format.name()))
            .field("handle_exceptions", &self.handle_exceptions)
            .field("handle_rejections", &self.handle_rejections)
            .finish()
    }
}

/// Which records a binding is in the business of receiving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    /// Attached with `add`; routed by threshold
    Regular,
    /// Dedicated panic handler; receives only `exception: true` records
    Exceptions,
    /// Dedicated rejection handler; receives only `rejection: true` records
    Rejections,
}

pub(crate) struct Delivery {
    pub(crate) record: LogRecord,
    pub(crate) ack: Option<Sender<()>>,
}

/// What the write path needs from a binding, cloned out from under the lock
#[derive(Clone)]
pub(crate) struct Route {
    pub(crate) id: SinkId,
    pub(crate) role: Role,
    pub(crate) level: Option<String>,
    pub(crate) format: Option<Arc<dyn Format>>,
    pub(crate) handle_exceptions: bool,
    pub(crate) handle_rejections: bool,
    pub(crate) sender: Sender<Delivery>,
}

impl Route {
    /// Whether this binding takes `record` under the logger threshold `threshold`
    pub(crate) fn accepts(&self, record: &LogRecord, levels: &Levels, threshold: &str) -> bool {
        match self.role {
            Role::Exceptions => record.is_exception(),
            Role::Rejections => record.is_rejection(),
            Role::Regular => {
                if record.is_exception() && !self.handle_exceptions {
                    return false;
                }
                if record.is_rejection() && !self.handle_rejections {
                    return false;
                }
                let own = self.level.as_deref().unwrap_or(threshold);
                levels.accepts(own, record.routing_level().unwrap_or_default())
            }
        }
    }
}

pub(crate) struct Binding {
    pub(crate) sink: Sink,
    pub(crate) order: u64,
    route: Route,
    delivery: Arc<dyn Transport>,
    worker: Option<JoinHandle<()>>,
    /// Set when the binding is detached from its own worker thread
    close_on_exit: Arc<AtomicBool>,
}

impl Binding {
    /// Attach `delivery` (the sink itself, or its legacy bridge) and start its worker
    pub(crate) fn spawn(
        sink: Sink,
        delivery: Arc<dyn Transport>,
        opts: BindingOptions,
        role: Role,
        order: u64,
        events: Arc<EventHub>,
        metrics: Arc<LoggerMetrics>,
    ) -> Result<Self> {
        let (sender, receiver) = unbounded();
        let name = sink.name().to_string();
        let close_on_exit = Arc::new(AtomicBool::new(false));
        let worker = thread::Builder::new()
            .name(format!("logfan-{}", name))
            .spawn({
                let delivery = Arc::clone(&delivery);
                let close_on_exit = Arc::clone(&close_on_exit);
                move || {
                    drain(&name, delivery.as_ref(), receiver, &events, &metrics);
                    if close_on_exit.load(Ordering::Acquire) {
                        close(&name, delivery.as_ref(), &events);
                    }
                }
            })?;

        let route = Route {
            id: sink.id(),
            role,
            level: opts.level.or_else(|| sink.level().map(str::to_string)),
            format: opts.format.or_else(|| delivery.format()),
            handle_exceptions: opts.handle_exceptions || sink.handles_exceptions(),
            handle_rejections: opts.handle_rejections || sink.handles_rejections(),
            sender,
        };

        Ok(Self {
            sink,
            order,
            route,
            delivery,
            worker: Some(worker),
            close_on_exit,
        })
    }

    pub(crate) fn id(&self) -> SinkId {
        self.route.id
    }

    pub(crate) fn role(&self) -> Role {
        self.route.role
    }

    pub(crate) fn route(&self) -> &Route {
        &self.route
    }

    /// Own threshold override, if any
    pub(crate) fn level(&self) -> Option<&str> {
        self.route.level.as_deref()
    }

    pub(crate) fn handles_exceptions(&self) -> bool {
        self.route.handle_exceptions
    }

    pub(crate) fn handles_rejections(&self) -> bool {
        self.route.handle_rejections
    }

    /// Stop accepting records, wait for the queue to drain, then release the sink.
    ///
    /// Already queued records are still delivered. Called from the binding's
    /// own worker (an event callback removing the sink that just failed), the
    /// worker is left to drain and close the sink after the callback returns.
    pub(crate) fn detach(self) -> Sink {
        let Binding {
            sink,
            route,
            delivery,
            worker,
            close_on_exit,
            ..
        } = self;
        drop(route);

        if let Some(worker) = worker {
            if worker.thread().id() == thread::current().id() {
                close_on_exit.store(true, Ordering::Release);
                return sink;
            }
            if worker.join().is_err() {
                eprintln!("[LOGGER ERROR] Worker for transport '{}' panicked", sink.name());
            }
        }
        delivery.close();
        sink
    }

    /// Stop accepting records and wait up to `timeout` for the worker.
    ///
    /// The sink is not released; used when the logger is dropped without
    /// `close()`.
    pub(crate) fn abandon(self, timeout: Duration) {
        let Binding {
            sink, route, worker, ..
        } = self;
        drop(route);

        let Some(worker) = worker else {
            return;
        };
        if worker.thread().id() == thread::current().id() {
            return;
        }
        let start = Instant::now();
        loop {
            if worker.is_finished() {
                if worker.join().is_err() {
                    eprintln!("[LOGGER ERROR] Worker for transport '{}' panicked", sink.name());
                }
                return;
            }
            if start.elapsed() >= timeout {
                eprintln!(
                    "[LOGGER WARNING] Transport '{}' did not drain within {:?}. \
                     Some logs may be lost.",
                    sink.name(),
                    timeout
                );
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

fn drain(
    name: &str,
    transport: &dyn Transport,
    receiver: Receiver<Delivery>,
    events: &EventHub,
    metrics: &LoggerMetrics,
) {
    // sink panics here are transport errors, not crashes
    hook::exempt_current_thread();

    for delivery in receiver.iter() {
        match catch_unwind(AssertUnwindSafe(|| transport.log(&delivery.record))) {
            Ok(Ok(())) => {
                metrics.record_delivered();
            }
            Ok(Err(e)) => {
                metrics.record_transport_failure();
                events.transport_error(name, e.to_string());
            }
            Err(panic) => {
                metrics.record_transport_failure();
                events.transport_error(name, format!("panicked: {}", panic_message(&*panic)));
            }
        }

        if let Some(ack) = delivery.ack {
            let _ = ack.send(());
        }
    }

    match catch_unwind(AssertUnwindSafe(|| transport.flush())) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => events.transport_error(name, format!("flush failed: {}", e)),
        Err(panic) => events.transport_error(
            name,
            format!("panicked during flush: {}", panic_message(&*panic)),
        ),
    }
}

fn close(name: &str, transport: &dyn Transport, events: &EventHub) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(|| transport.close())) {
        events.transport_error(
            name,
            format!("panicked during close: {}", panic_message(&*panic)),
        );
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Validate a per-binding threshold against the registry
pub(crate) fn check_level(levels: &Levels, opts: &BindingOptions) -> Result<()> {
    match opts.level.as_deref() {
        Some(level) if !levels.contains(level) => Err(LoggerError::config(
            "Transport",
            format!("level '{}' is not defined", level),
        )),
        _ => Ok(()),
    }
}
