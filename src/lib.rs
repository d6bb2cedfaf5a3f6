//! # logfan
//!
//! A structured logging core: records are filtered by named severity levels,
//! run once through a format pipeline, then fanned out to any number of
//! independently failing transports. Uncaught panics and unhandled
//! rejections can be captured as last-resort diagnostic records.
//!
//! ## Features
//!
//! - **Level registry**: npm, syslog and cli presets or any custom table
//! - **Fan-out**: one worker per transport, FIFO per transport, isolated failures
//! - **Legacy transports**: callback-style sinks bridged into the same pipeline
//! - **Child loggers**: extra metadata resolved through the parent at write time
//! - **Crash capture**: panic hook and rejection channel with a bounded exit wait
//!
//! ```
//! use logfan::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let memory = Arc::new(MemoryTransport::new());
//! let logger = Logger::builder()
//!     .level("debug")
//!     .transport(memory.clone())
//!     .build()
//!     .unwrap();
//!
//! logger.log_with("info", "user signed in", json!({"user": "ada"})).unwrap();
//! logger.close();
//! assert_eq!(memory.records()[0].get("user").unwrap(), "ada");
//! ```

pub mod capture;
pub mod core;
pub mod formats;
pub mod macros;
pub mod transports;

#[doc(hidden)]
pub use serde_json::json as __json;

pub mod prelude {
    pub use crate::capture::{Capture, FatalError};
    pub use crate::core::{
        BindingOptions, ChildLogger, LevelHandle, Levels, LogRecord, Logger, LoggerBuilder,
        LoggerConfig, LoggerError, LoggerEvent, LoggerExt, Notice, NoticeKind, Result, Sink,
        Transport,
    };
    pub use crate::formats::{Json, Logfmt, Simple, Timestamp};
    pub use crate::transports::{ConsoleTransport, MemoryTransport};
}

pub use crate::capture::{report_rejection, Capture, FatalError};
pub use crate::core::{
    format_fn, BindingOptions, ChildLogger, EventCallback, ExitHandler, ExitOnError, Format,
    LegacyCallback, LegacyTransport, LevelHandle, Levels, LevelsConfig, LogRecord, Logger,
    LoggerBuilder, LoggerConfig, LoggerError, LoggerEvent, LoggerExt, LoggerMetrics, Notice,
    NoticeKind, Pipeline, Result, Sink, Timer, Transport, TransportEvent, TransportEvents,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use crate::transports::{ConsoleTransport, MemoryTransport};
