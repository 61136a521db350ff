//! Error types for the broker.

use thiserror::Error;

/// Result type alias for broker operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while brokering context and intents.
#[derive(Error, Debug)]
pub enum Error {
    // Channel errors
    #[error("Channel id is reserved: {0}")]
    ReservedChannelId(String),

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    // Routing errors
    #[error("No handler found for {0}")]
    NoHandlerFound(String),

    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("Directory search failed: {0}")]
    DirectorySearchFailed(String),

    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    #[error("App not found in directory: {0}")]
    AppNotFound(String),

    // Resolver errors
    #[error("No outstanding resolution for correlation id {0}")]
    ResolutionNotFound(String),

    #[error("Intent resolution was cancelled")]
    ResolutionCancelled,

    #[error("Intent resolution timed out after {0}ms")]
    ResolutionTimedOut(u64),

    // Collaborator errors
    #[error("Host error: {0}")]
    Host(String),

    #[error("Broker event loop has stopped")]
    BrokerStopped,

    // Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl Error {
    /// Whether the error should be reported back to the raising instance
    /// rather than treated as a broker fault.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Error::ReservedChannelId(_)
                | Error::ChannelNotFound(_)
                | Error::NoHandlerFound(_)
                | Error::MissingRequiredField(_)
                | Error::InstanceNotFound(_)
                | Error::AppNotFound(_)
        )
    }
}
