//! Connection state machine values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a connection ended up in the error state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorReason {
    /// The transport handshake failed.
    ConnectFailed,
    /// An established link failed while reading.
    ConnectionLost,
}

/// Lifecycle state of a [`ConnectionController`](crate::ConnectionController).
///
/// ```text
/// Disconnected ──connect()──► Connecting ──ok──► Connected
///      ▲                          │                  │
///      │                        failed          read failure
///      │                          ▼                  ▼
///      └──────disconnect()── Error(ConnectFailed | ConnectionLost)
/// ```
///
/// `disconnect()` from `Connecting` or `Connected` goes straight back to
/// `Disconnected`. There is no automatic reconnect state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error(ErrorReason),
}

impl ConnectionState {
    /// `connect()` is accepted from here.
    pub fn can_connect(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Error(_))
    }

    /// A transport is open or being opened.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// The error annotation, if any.
    pub fn error_reason(&self) -> Option<ErrorReason> {
        match self {
            Self::Error(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorReason::ConnectFailed => f.write_str("connect failed"),
            ErrorReason::ConnectionLost => f.write_str("connection lost"),
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => f.write_str("disconnected"),
            ConnectionState::Connecting => f.write_str("connecting"),
            ConnectionState::Connected => f.write_str("connected"),
            ConnectionState::Error(reason) => write!(f, "error ({})", reason),
        }
    }
}
