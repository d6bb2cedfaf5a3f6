//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// A format stage failed while transforming a record
    #[error("Format pipeline error ({format}): {message}")]
    Pipeline { format: String, message: String },

    /// A bound transport reported a failure
    #[error("Transport '{transport}' failed: {message}")]
    Transport { transport: String, message: String },

    /// Logger already closed
    #[error("Logger already closed")]
    LoggerClosed,

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a format pipeline error
    pub fn pipeline(format: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Pipeline {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(transport: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Transport {
            transport: transport.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Whether this error came from a configuration mistake
    pub fn is_configuration(&self) -> bool {
        matches!(self, LoggerError::InvalidConfiguration { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::config("Levels", "no levels defined");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
        assert!(err.is_configuration());

        let err = LoggerError::pipeline("json", "bad value");
        assert!(matches!(err, LoggerError::Pipeline { .. }));
        assert!(!err.is_configuration());

        let err = LoggerError::transport("console", "broken pipe");
        assert!(matches!(err, LoggerError::Transport { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::config("Logger", "level 'loud' is not defined");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for Logger: level 'loud' is not defined"
        );

        let err = LoggerError::pipeline("timestamp", "clock went backwards");
        assert_eq!(
            err.to_string(),
            "Format pipeline error (timestamp): clock went backwards"
        );

        let err = LoggerError::transport("file", "disk full");
        assert_eq!(err.to_string(), "Transport 'file' failed: disk full");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: LoggerError = io_err.into();

        assert!(matches!(err, LoggerError::IoError(_)));
        assert!(err.to_string().contains("access denied"));
    }
}
