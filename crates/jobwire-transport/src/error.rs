/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection target could not be parsed or uses an unsupported scheme.
    #[error("invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    /// The bearer credential cannot be carried in an HTTP header.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The WebSocket session could not be established.
    #[error("failed to connect to {target}: {source}")]
    Connect {
        target: String,
        source: Box<tokio_tungstenite::tungstenite::Error>,
    },

    /// A WebSocket protocol or I/O error occurred on an open session.
    #[error("websocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    /// The session has been closed locally or by the peer.
    #[error("transport closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
