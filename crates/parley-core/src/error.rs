//! Error types shared by every layer that talks to the chat service.

use thiserror::Error;

/// Boxed error returned by plugin entry points.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error code the server uses when a long-poll queue has expired.
pub const BAD_EVENT_QUEUE_ID: &str = "BAD_EVENT_QUEUE_ID";

// =============================================================================
// API Errors
// =============================================================================

/// Errors that can occur when calling the remote chat service.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The server answered with `result: "error"`.
    #[error("remote error ({code}): {msg}")]
    Remote {
        /// Machine-readable error code (`BAD_REQUEST` when the server sent none).
        code: String,
        /// Human-readable message sent by the server.
        msg: String,
    },

    /// The request never produced a usable HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,
}

impl ApiError {
    /// Creates a remote error from a code and message.
    pub fn remote(code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Remote {
            code: code.into(),
            msg: msg.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Returns `true` if the server discarded the event queue we were polling.
    pub fn is_bad_event_queue(&self) -> bool {
        matches!(self, Self::Remote { code, .. } if code == BAD_EVENT_QUEUE_ID)
    }

    /// Returns `true` for failures worth retrying after a pause
    /// (network trouble rather than a rejected request).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for remote API calls.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_event_queue_detection() {
        assert!(ApiError::remote(BAD_EVENT_QUEUE_ID, "Bad event queue id: abc").is_bad_event_queue());
        assert!(!ApiError::remote("BAD_REQUEST", "nope").is_bad_event_queue());
        assert!(!ApiError::Timeout.is_bad_event_queue());
    }

    #[test]
    fn test_transient_errors() {
        assert!(ApiError::transport("connection reset").is_transient());
        assert!(ApiError::Timeout.is_transient());
        assert!(!ApiError::decode("missing field").is_transient());
        assert!(!ApiError::remote("UNAUTHORIZED", "Invalid API key").is_transient());
    }
}
