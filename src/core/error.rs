//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File destination error with path
    #[error("File destination error for '{path}': {message}")]
    FileDestinationError { path: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// Formatter error with format type
    #[error("Formatter error ({format_type}): {message}")]
    FormatterError {
        format_type: String,
        message: String,
    },

    /// A destination reported a failure from `deliver` or `flush`
    #[error("Destination '{destination}' failed: {message}")]
    DestinationFailed {
        destination: String,
        message: String,
    },

    /// A destination panicked inside `deliver` or `flush`
    #[error("Destination '{destination}' panicked: {message}")]
    DestinationPanicked {
        destination: String,
        message: String,
    },

    /// The drain thread could not be started
    #[error("Failed to spawn drain thread '{name}': {source}")]
    WorkerSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a file destination error
    pub fn file_destination(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileDestinationError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a formatter error
    pub fn formatter(format_type: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatterError {
            format_type: format_type.into(),
            message: message.into(),
        }
    }

    /// Create a destination failure
    pub fn destination(destination: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::DestinationFailed {
            destination: destination.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from a caught panic rather than a returned `Err`
    #[must_use]
    pub fn is_panic(&self) -> bool {
        matches!(self, LoggerError::DestinationPanicked { .. })
    }
}
