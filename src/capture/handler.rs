//! Exception and rejection capture bound to one logger

use super::diagnostics::{OsInfo, ProcessInfo};
use super::fatal::FatalError;
use super::hook::{self, Channel};
use crate::core::binding::{BindingOptions, Role};
use crate::core::error::{LoggerError, Result};
use crate::core::events::NoticeKind;
use crate::core::logger::LoggerInner;
use crate::core::record::{LogRecord, EXCEPTION_FIELD, REJECTION_FIELD};
use crate::core::transport::Sink;
use crossbeam_channel::RecvTimeoutError;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// How long a capture waits for handlers before deciding on exit
pub const CAPTURE_TIMEOUT: Duration = Duration::from_millis(3000);

/// What happened when a fatal error was reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOutcome {
    /// The exit handler was invoked
    pub exited: bool,
    /// Handlers had not all acknowledged when the wait ran out
    pub timed_out: bool,
    /// Handlers the capture waited on
    pub handlers: usize,
    /// Handlers whose delivery was discarded before it was written
    pub lost: usize,
}

/// Turns fatal errors of one channel into diagnostic records.
///
/// The handler set only grows; `unhandle` disarms the process hook but keeps
/// the handlers, so a later `handle()` with no arguments restores the same
/// behavior. Only one capture per channel is armed at a time process-wide.
///
/// # Example
///
/// ```no_run
/// use logfan::prelude::*;
/// use std::sync::Arc;
///
/// let crashes = Arc::new(MemoryTransport::new());
/// let logger = Logger::builder()
///     .exception_handler(crashes.clone())
///     .build()
///     .unwrap();
///
/// assert!(logger.exceptions().is_armed());
/// logger.exceptions().unhandle();
/// assert_eq!(logger.exceptions().handler_count(), 1);
/// ```
pub struct Capture {
    state: Arc<CaptureState>,
}

pub(crate) struct CaptureState {
    channel: Channel,
    logger: Weak<LoggerInner>,
    handlers: Mutex<Vec<Sink>>,
    armed: AtomicBool,
}

impl Capture {
    pub(crate) fn new(channel: Channel, logger: Weak<LoggerInner>) -> Self {
        Self {
            state: Arc::new(CaptureState {
                channel,
                logger,
                handlers: Mutex::new(Vec::new()),
                armed: AtomicBool::new(false),
            }),
        }
    }

    pub fn channel(&self) -> Channel {
        self.state.channel
    }

    /// Add dedicated handler sinks and arm the process hook.
    ///
    /// Sinks already in the handler set are skipped. Each new sink gets its own
    /// binding that receives only this channel's diagnostic records. Fails with
    /// [`LoggerError::LoggerClosed`] once the logger is closed.
    pub fn handle<I, S>(&self, sinks: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<Sink>,
    {
        let logger = self
            .state
            .logger
            .upgrade()
            .ok_or(LoggerError::LoggerClosed)?;
        if logger.is_closed() {
            return Err(LoggerError::LoggerClosed);
        }
        let role = match self.state.channel {
            Channel::Exception => Role::Exceptions,
            Channel::Rejection => Role::Rejections,
        };

        for sink in sinks {
            let sink = sink.into();
            if self.state.handlers.lock().iter().any(|h| h.id() == sink.id()) {
                continue;
            }
            logger.attach(sink.clone(), BindingOptions::default(), role)?;
            self.state.handlers.lock().push(sink);
        }

        if !self.state.armed.swap(true, Ordering::AcqRel) {
            hook::install(&self.state);
        }
        Ok(())
    }

    /// Disarm the process hook; the handler set is kept
    pub fn unhandle(&self) {
        if self.state.armed.swap(false, Ordering::AcqRel) {
            hook::uninstall(&self.state);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.state.armed.load(Ordering::Acquire)
    }

    pub fn handler_count(&self) -> usize {
        self.state.handlers.lock().len()
    }

    pub fn handlers(&self) -> Vec<Sink> {
        self.state.handlers.lock().clone()
    }

    /// Run the crash path for `err` as if the hook had fired
    pub fn report(&self, err: &FatalError) -> CaptureOutcome {
        self.state.report(err)
    }
}

impl Drop for Capture {
    fn drop(&mut self) {
        self.unhandle();
    }
}

impl std::fmt::Debug for Capture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capture")
            .field("channel", &self.state.channel)
            .field("armed", &self.is_armed())
            .field("handlers", &self.handler_count())
            .finish()
    }
}

impl CaptureState {
    pub(crate) fn channel(&self) -> Channel {
        self.channel
    }

    /// Another capture took the hook over
    pub(crate) fn disarm(&self) {
        self.armed.store(false, Ordering::Release);
    }

    pub(crate) fn report(&self, err: &FatalError) -> CaptureOutcome {
        let mut outcome = CaptureOutcome {
            exited: false,
            timed_out: false,
            handlers: 0,
            lost: 0,
        };
        let Some(logger) = self.logger.upgrade() else {
            eprintln!("[LOGGER ERROR] {}: {}", self.channel.prefix(), err);
            return outcome;
        };

        let handlers = logger.crash_handlers(self.channel);
        outcome.handlers = handlers.len();

        let mut exit = logger.should_exit(err);
        if exit && handlers.is_empty() {
            logger.events().notice(
                NoticeKind::ExitDowngraded,
                format!(
                    "exit_on_error cannot be honored with no {} handlers; not exiting",
                    self.channel.prefix()
                ),
            );
            exit = false;
        }

        let acks = match logger.dispatch(diagnostic_record(self.channel, err), true) {
            Ok(acks) => acks,
            Err(e) => {
                eprintln!("[LOGGER ERROR] Failed to format crash record: {}", e);
                Vec::new()
            }
        };

        let deadline = Instant::now() + CAPTURE_TIMEOUT;
        for (_, ack) in acks.iter().filter(|(id, _)| handlers.contains(id)) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match ack.recv_timeout(remaining) {
                Ok(()) => {}
                Err(RecvTimeoutError::Disconnected) => outcome.lost += 1,
                Err(RecvTimeoutError::Timeout) => {
                    outcome.timed_out = true;
                    break;
                }
            }
        }
        if outcome.lost > 0 {
            logger.events().notice(
                NoticeKind::CaptureLost,
                format!(
                    "{} of {} handlers dropped the {} record without writing it",
                    outcome.lost,
                    handlers.len(),
                    self.channel.prefix()
                ),
            );
        }
        if outcome.timed_out {
            logger.events().notice(
                NoticeKind::CaptureTimeout,
                format!(
                    "handlers did not finish writing the {} record within {}ms",
                    self.channel.prefix(),
                    CAPTURE_TIMEOUT.as_millis()
                ),
            );
        }

        if exit {
            outcome.exited = true;
            logger.exit(1);
        }
        outcome
    }
}

/// Diagnostic record for a fatal error on `channel`
pub fn diagnostic_record(channel: Channel, err: &FatalError) -> LogRecord {
    let stack = err.stack();
    let message = format!("{}: {}\n{}", channel.prefix(), err.message(), stack);
    let flag = match channel {
        Channel::Exception => EXCEPTION_FIELD,
        Channel::Rejection => REJECTION_FIELD,
    };
    let trace: Vec<Value> = err
        .frames()
        .iter()
        .filter_map(|frame| serde_json::to_value(frame).ok())
        .collect();

    LogRecord::new("error", message)
        .with_field("error", err.to_json())
        .with_field("stack", stack)
        .with_field(flag, true)
        .with_field("date", chrono::Utc::now().to_rfc2822())
        .with_field(
            "process",
            serde_json::to_value(ProcessInfo::collect()).unwrap_or_default(),
        )
        .with_field(
            "os",
            serde_json::to_value(OsInfo::collect()).unwrap_or_default(),
        )
        .with_field("trace", trace)
}
