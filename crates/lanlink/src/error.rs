//! Error types for the link engine.

use std::fmt;

/// Link-specific errors.
#[derive(Debug, Clone)]
pub enum NetworkError {
    /// The listening socket could not be bound.
    Bind(String),
    /// Accepting an inbound connection failed.
    Accept(String),
    /// A blocking wait was interrupted by an explicit stop. Never delivered
    /// to an event sink.
    Cancelled,
    /// The session read loop hit a stream fault (not an orderly close).
    SessionRead(String),
    /// A write to the connected client failed. Write failures do not close
    /// the session on their own.
    SessionWrite(String),
    /// I/O error.
    Io(String),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind(msg) => write!(f, "Bind error: {msg}"),
            Self::Accept(msg) => write!(f, "Accept error: {msg}"),
            Self::Cancelled => write!(f, "Operation was cancelled"),
            Self::SessionRead(msg) => write!(f, "Session read error: {msg}"),
            Self::SessionWrite(msg) => write!(f, "Session write error: {msg}"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for NetworkError {}

impl From<std::io::Error> for NetworkError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// A specialized Result type for link operations.
pub type Result<T> = std::result::Result<T, NetworkError>;
