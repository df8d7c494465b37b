use thiserror::Error;

/// Failures surfaced by the REST layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered HTTP 401; the cached token has already been purged.
    #[error("not authenticated")]
    Unauthorized,
    /// Non-2xx status or an envelope with `success: false`.
    #[error("request rejected: {message}")]
    Rejected {
        /// HTTP status, when the rejection came from the status line.
        status: Option<u16>,
        /// Server-provided message, or a generic one.
        message: String,
    },
    /// Connection, TLS or body read failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The body was not the JSON we expected.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    /// Envelope reported success but carried no `data`.
    #[error("response missing data")]
    MissingData,
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// Server message for a rejection, if it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Local validation of a typed session code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("Code must be 6 characters")]
    InvalidLength,
}

/// Push channel failures.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("invalid frame: {0}")]
    Frame(#[from] serde_json::Error),
    #[error("transport is not connected")]
    NotConnected,
}
