use std::fmt;

use scout_core::{Chunk, SessionId};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// One parsed chunk of a running session, in arrival order.
    Chunk { session_id: SessionId, chunk: Chunk },
    /// The producer closed the stream.
    StreamEnded { session_id: SessionId },
    /// The service answered badly or the body broke off mid-stream.
    StreamFailed {
        session_id: SessionId,
        error: TransportError,
    },
    /// The target address could not be reached at all.
    Unreachable {
        session_id: SessionId,
        error: TransportError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: FailureKind,
    pub message: String,
}

impl TransportError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Unreachable,
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
}

impl FailureKind {
    /// Failures the operator can fix by pointing the client at another address.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, FailureKind::Unreachable | FailureKind::InvalidUrl)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Unreachable => write!(f, "service unreachable"),
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
