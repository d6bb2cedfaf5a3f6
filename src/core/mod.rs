//! Core logger types and traits

pub(crate) mod binding;
pub mod child;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub(crate) mod legacy;
pub mod levels;
pub mod logger;
pub mod metrics;
pub mod profiler;
pub mod record;
pub mod shorthand;
pub mod transport;

pub use binding::BindingOptions;
pub use child::ChildLogger;
pub use config::{ExitHandler, ExitOnError, ExitPredicate, LevelsConfig, LoggerConfig};
pub use error::{LoggerError, Result};
pub use events::{EventCallback, LoggerEvent, Notice, NoticeKind};
pub use format::{format_fn, FnFormat, Format, Pipeline};
pub use levels::Levels;
pub use logger::{Logger, LoggerBuilder, DEFAULT_SHUTDOWN_TIMEOUT};
pub use metrics::LoggerMetrics;
pub use profiler::Timer;
pub use record::{LogRecord, EXCEPTION_FIELD, REJECTION_FIELD};
pub use shorthand::{LevelHandle, LoggerExt};
pub use transport::{
    LegacyCallback, LegacyTransport, ListenerId, Sink, SinkId, Transport, TransportEvent,
    TransportEvents, TransportListener,
};
