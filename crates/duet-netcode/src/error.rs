//! Error types for duet-netcode

use duet_core::PeerId;
use thiserror::Error;

/// Netcode error type
#[derive(Debug, Error)]
pub enum Error {
    /// Transport error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Packet addressed to a peer the transport does not know
    #[error("Unknown peer: {0}")]
    UnknownPeer(PeerId),

    /// Error raised by the shared model
    #[error(transparent)]
    Core(#[from] duet_core::Error),
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type for netcode operations
pub type Result<T> = std::result::Result<T, Error>;
