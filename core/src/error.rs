//! Error types for the Timetonic client core.
//!
//! # Design
//! The remote service answers HTTP 200 even when it refuses a request, so
//! `Rejected` (a `"nok"` envelope) is kept apart from `HttpError` (a non-2xx
//! status). Transport failures carry the underlying cause as text so the
//! error stays `Clone` and can be published to UI state and across FFI.

use thiserror::Error;

/// Errors returned by the API client, the transport and the repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, refused connection, TLS...).
    #[error("network error: {0}")]
    Transport(String),

    /// The transport gave up waiting for the server.
    #[error("request timed out")]
    Timeout,

    /// The server answered `status: "nok"`. Displays as `"<code> <message>"`,
    /// leaving out whichever part is empty.
    #[error("{}", join_nonempty(.code, .message))]
    Rejected { code: String, message: String },

    /// The server returned a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request parameters could not be encoded.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// Persisting or reading a credential failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors raised by session storage backends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session storage I/O failed: {0}")]
    Io(String),

    #[error("session file is corrupt: {0}")]
    Format(String),
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Format(err.to_string())
    }
}

fn join_nonempty(code: &str, message: &str) -> String {
    match (code.is_empty(), message.is_empty()) {
        (false, false) => format!("{code} {message}"),
        (true, _) => message.to_string(),
        (false, true) => code.to_string(),
    }
}
