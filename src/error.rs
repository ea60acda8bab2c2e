//! Error types for the telemetry link.
//!
//! Two families of errors exist:
//!
//! - [`LinkError`] covers everything that can go wrong with the connection itself:
//!   failed handshakes, lost links, oversized frames, invalid lifecycle calls and
//!   bad configuration.
//! - [`DecodeError`] covers a single frame that could not be turned into a value.
//!   It never terminates a connection; the controller reports it and keeps reading.
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use thermolink::LinkError;
//!
//! let error = LinkError::connect_failed("device unreachable");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use thiserror::Error;

use crate::types::ConnectionState;

/// Result type alias for link operations.
pub type Result<T, E = LinkError> = std::result::Result<T, E>;

/// Main error type for connection and framing operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LinkError {
    #[error("Failed to connect: {reason}")]
    ConnectFailed {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Connection lost: {reason}")]
    ConnectionLost {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Frame exceeds {limit} bytes without a delimiter ({observed} bytes buffered)")]
    FrameTooLong { limit: usize, observed: usize },

    #[error("Connection already active (state: {state})")]
    AlreadyConnected { state: ConnectionState },

    #[error("Not connected")]
    NotConnected,

    #[error("Connect attempt cancelled by disconnect")]
    Cancelled,

    #[error("Invalid configuration: {details}")]
    Config { details: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinkError {
    /// Returns whether a new `connect()` might succeed after this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            LinkError::ConnectFailed { .. } => true,
            LinkError::ConnectionLost { .. } => true,
            LinkError::FrameTooLong { .. } => true,
            LinkError::Cancelled => true,
            LinkError::Io(_) => true,
            LinkError::AlreadyConnected { .. } => false,
            LinkError::NotConnected => false,
            LinkError::Config { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            LinkError::ConnectFailed { .. } => vec![
                "Check that the device is powered on and in range",
                "Verify the device is paired with this host",
                "Check Bluetooth connect permissions",
            ],
            LinkError::ConnectionLost { .. } => vec![
                "Move closer to the device",
                "Check the device battery",
                "Call connect() again",
            ],
            LinkError::FrameTooLong { .. } => vec![
                "Verify the device terminates each message with a newline",
                "Raise max_frame_len if messages are legitimately large",
            ],
            LinkError::AlreadyConnected { .. } => {
                vec!["Call disconnect() before connecting again"]
            }
            LinkError::NotConnected => vec!["Call connect() first"],
            LinkError::Cancelled => vec!["Call connect() again if the link is still wanted"],
            LinkError::Config { .. } => vec!["Fix the configuration value named in the error"],
            LinkError::Io(_) => vec!["Check the underlying transport", "Retry the operation"],
        }
    }

    /// Helper constructor for handshake failures.
    pub fn connect_failed(reason: impl Into<String>) -> Self {
        LinkError::ConnectFailed { reason: reason.into(), source: None }
    }

    /// Helper constructor for handshake failures with source.
    pub fn connect_failed_with_source(
        reason: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        LinkError::ConnectFailed { reason: reason.into(), source: Some(source.into()) }
    }

    /// Helper constructor for a link that dropped while connected.
    pub fn connection_lost(reason: impl Into<String>) -> Self {
        LinkError::ConnectionLost { reason: reason.into(), source: None }
    }

    /// Helper constructor for a dropped link with source.
    pub fn connection_lost_with_source(
        reason: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        LinkError::ConnectionLost { reason: reason.into(), source: Some(source.into()) }
    }

    /// Helper constructor for configuration errors.
    pub fn config(details: impl Into<String>) -> Self {
        LinkError::Config { details: details.into() }
    }
}

/// A single frame could not be decoded.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("Empty frame")]
    Empty,

    #[error("Frame is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
