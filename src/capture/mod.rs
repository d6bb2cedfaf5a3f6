//! Crash capture
//!
//! Turns uncaught panics and unhandled rejections into diagnostic log records,
//! waits (bounded) for handler transports to write them, then applies the
//! logger's exit policy.

pub mod diagnostics;
pub mod fatal;
pub mod handler;
pub mod hook;

#[cfg(feature = "tokio")]
pub mod task;

pub use diagnostics::{MemoryUsage, OsInfo, ProcessInfo, StackFrame};
pub use fatal::FatalError;
pub use handler::{diagnostic_record, Capture, CaptureOutcome, CAPTURE_TIMEOUT};
pub use hook::{report_rejection, Channel};

#[cfg(feature = "tokio")]
pub use task::watch_task;
