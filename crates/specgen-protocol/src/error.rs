//! Error types for the protocol client
//!
//! Two layers:
//! - [`CodecError`]: framing and (de)serialization of single envelopes
//! - [`ClientError`]: what a caller of the client sees

use std::time::Duration;

/// Errors while reading or writing a single frame
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Underlying stream failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Peer closed the stream at a frame boundary
    #[error("connection closed by peer")]
    Closed,

    /// Declared frame length exceeds the configured maximum
    #[error("frame of {len} bytes exceeds maximum of {max} bytes")]
    FrameTooLarge {
        /// Declared body length
        len: usize,
        /// Configured limit
        max: usize,
    },

    /// Frame body is not a valid envelope
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl CodecError {
    /// Whether the stream itself failed (as opposed to its content)
    #[inline]
    #[must_use]
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Closed)
    }

    /// Whether the stream is still positioned at a frame boundary
    ///
    /// Only a fully read body that fails to decode qualifies; after an
    /// oversize prefix the body is still unread.
    #[inline]
    #[must_use]
    pub fn leaves_stream_aligned(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

/// Errors surfaced by the specification client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure: unreachable, disconnected, I/O error
    #[error("connection error: {message}")]
    Connection {
        /// What failed
        message: String,
        /// Underlying I/O error, when there is one
        #[source]
        source: Option<std::io::Error>,
    },

    /// No correlated response arrived within the deadline
    #[error("request {message_id} timed out after {}ms", .timeout.as_millis())]
    Timeout {
        /// Id of the unanswered request
        message_id: i64,
        /// Deadline that passed
        timeout: Duration,
    },

    /// Response arrived but had the wrong type or missing fields
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Caller cancelled the exchange
    #[error("request cancelled")]
    Cancelled,
}

impl ClientError {
    /// Create connection error without an io source
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Create protocol error
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Transport-level failures, timeouts included
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }

    /// Response-level failures
    #[inline]
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }
}

impl From<CodecError> for ClientError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(source) => Self::Connection {
                message: source.to_string(),
                source: Some(source),
            },
            CodecError::Closed => Self::connection("connection closed by peer"),
            other @ (CodecError::FrameTooLarge { .. } | CodecError::Malformed(_)) => {
                Self::Protocol(other.to_string())
            }
        }
    }
}
