//! Logging macros for ergonomic log message formatting.
//!
//! These macros provide a convenient interface for logging with automatic
//! string formatting, similar to `println!` and `format!`. An optional
//! `{ ... }` block before the format string is merged in as metadata.
//!
//! # Examples
//!
//! ```
//! use logfan::prelude::*;
//! use logfan::info;
//!
//! let logger = Logger::new();
//!
//! // Basic logging
//! info!(logger, "Server started").unwrap();
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port).unwrap();
//!
//! // With metadata
//! info!(logger, { "port": port, "tls": true }, "Listening").unwrap();
//! ```

/// Log a formatted message at any level name.
///
/// # Examples
///
/// ```
/// # use logfan::prelude::*;
/// # let logger = Logger::builder().levels(Levels::syslog()).build().unwrap();
/// use logfan::log;
/// log!(logger, "notice", "Simple message").unwrap();
/// log!(logger, "crit", { "code": 500 }, "Error code: {}", 500).unwrap();
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, { $($meta:tt)* }, $($arg:tt)+) => {{
        use $crate::LoggerExt as _;
        $logger.log_with($level, format!($($arg)+), $crate::__json!({ $($meta)* }))
    }};
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        use $crate::LoggerExt as _;
        $logger.log($level, format!($($arg)+))
    }};
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use logfan::prelude::*;
/// # let logger = Logger::new();
/// use logfan::error;
/// error!(logger, "Failed to connect to database").unwrap();
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error").unwrap();
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, "error", $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, "warn", $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use logfan::prelude::*;
/// # let logger = Logger::new();
/// use logfan::info;
/// info!(logger, "Application started").unwrap();
/// info!(logger, "Processing {} items", 100).unwrap();
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, "info", $($arg)+)
    };
}

#[macro_export]
macro_rules! http {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, "http", $($arg)+)
    };
}

#[macro_export]
macro_rules! verbose {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, "verbose", $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, "debug", $($arg)+)
    };
}

#[macro_export]
macro_rules! silly {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, "silly", $($arg)+)
    };
}
