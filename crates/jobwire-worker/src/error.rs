use jobwire_transport::TransportError;

use crate::client::ClientPhase;
use crate::message::CodecError;

/// Errors that can occur in worker operations.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// Malformed target address, credential, or identity. Raised before any
    /// connection attempt.
    #[error("configuration error: {0}")]
    Config(String),

    /// The transport session could not be opened.
    #[error("connection failed: {0}")]
    Connection(#[source] TransportError),

    /// A message could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] CodecError),

    /// Writing a frame failed, including any send after close.
    #[error("send failed: {0}")]
    Send(#[source] TransportError),

    /// The operation is not valid in the client's current phase.
    #[error("invalid state: expected {expected}, client is {actual}")]
    InvalidState {
        expected: ClientPhase,
        actual: ClientPhase,
    },
}

pub type Result<T> = std::result::Result<T, WorkerError>;
