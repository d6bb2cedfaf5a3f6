//! Formats that ship with the crate
//!
//! Each is a [`Format`](crate::Format) stage. Stages that only add or rewrite
//! fields ([`Timestamp`], [`Colorize`]) go before a serializing stage
//! ([`Json`], [`Logfmt`], [`Simple`]) in a [`Pipeline`](crate::Pipeline).

#[cfg(feature = "console")]
pub mod colorize;
pub mod json;
pub mod logfmt;
pub mod simple;
pub mod timestamp;

#[cfg(feature = "console")]
pub use colorize::Colorize;
pub use json::Json;
pub use logfmt::Logfmt;
pub use simple::Simple;
pub use timestamp::{Timestamp, TimestampFormat};
