//! The error value handed to crash capture

use super::diagnostics::StackFrame;
use crate::core::binding::panic_message;
use backtrace::Backtrace;
use serde_json::{json, Value};
use std::error::Error;
use std::fmt;
use std::panic::PanicHookInfo;

/// Frames belonging to the capture machinery itself
const SKIPPED_FRAMES: &[&str] = &[
    "backtrace::",
    "logfan::capture::",
    "std::panicking",
    "core::panicking",
    "std::panic::",
    "rust_begin_unwind",
];

/// An uncaught panic or an unhandled rejection
///
/// Carries the message, the source location when known, a backtrace captured
/// at construction and, for rejections, the original error.
pub struct FatalError {
    message: String,
    location: Option<String>,
    backtrace: Backtrace,
    inner: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl FatalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            backtrace: Backtrace::new(),
            inner: None,
        }
    }

    /// Wrap an error nobody observed
    pub fn from_error<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            message: err.to_string(),
            location: None,
            backtrace: Backtrace::new(),
            inner: Some(Box::new(err)),
        }
    }

    pub fn from_panic(info: &PanicHookInfo<'_>) -> Self {
        Self {
            message: panic_message(info.payload()),
            location: info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column())),
            backtrace: Backtrace::new(),
            inner: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// `file:line:column` of a panic
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// The wrapped error, for downcasting in exit predicates
    pub fn inner(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.inner.as_deref()
    }

    /// Resolved frames, innermost first
    pub fn frames(&self) -> Vec<StackFrame> {
        let mut frames = Vec::new();
        for frame in self.backtrace.frames() {
            let symbols = frame.symbols();
            if symbols.is_empty() {
                frames.push(StackFrame::native(None));
                continue;
            }
            for symbol in symbols {
                let function = symbol.name().map(|name| format!("{:#}", name));
                if let Some(name) = &function {
                    if SKIPPED_FRAMES.iter().any(|prefix| name.starts_with(prefix)) {
                        continue;
                    }
                }
                match symbol.filename() {
                    Some(file) => frames.push(StackFrame::new(
                        file.display().to_string(),
                        symbol.lineno(),
                        symbol.colno(),
                        function,
                    )),
                    None => frames.push(StackFrame::native(function)),
                }
            }
        }
        frames
    }

    /// Message followed by one `    at function (file:line:column)` line per frame
    pub fn stack(&self) -> String {
        let mut stack = self.message.clone();
        let frames = self.frames();
        if frames.is_empty() {
            if let Some(location) = &self.location {
                stack.push_str(&format!("\n    at {}", location));
            }
        }
        for frame in frames {
            stack.push_str("\n    at ");
            stack.push_str(&frame.to_string());
        }
        stack
    }

    /// JSON shape of the `error` field in diagnostic records
    pub fn to_json(&self) -> Value {
        let mut causes = Vec::new();
        let mut source = self.source();
        while let Some(cause) = source {
            causes.push(Value::String(cause.to_string()));
            source = cause.source();
        }

        let mut error = json!({ "message": self.message });
        if let Some(location) = &self.location {
            error["location"] = Value::String(location.clone());
        }
        if !causes.is_empty() {
            error["causes"] = Value::Array(causes);
        }
        error
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} at {}", self.message, location),
            None => write!(f, "{}", self.message),
        }
    }
}

impl fmt::Debug for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FatalError")
            .field("message", &self.message)
            .field("location", &self.location)
            .finish()
    }
}

impl Error for FatalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner
            .as_deref()
            .and_then(|inner| inner.source())
    }
}
