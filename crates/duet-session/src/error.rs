//! Error types for duet-session

use thiserror::Error;

/// Session error type
#[derive(Error, Debug)]
pub enum Error {
    /// Error raised by the shared model
    #[error(transparent)]
    Core(#[from] duet_core::Error),

    /// Error raised while moving packets
    #[error(transparent)]
    Netcode(#[from] duet_netcode::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// A peer id that is not part of the session
    #[error("Unknown peer: {0}")]
    UnknownPeer(duet_core::PeerId),

    /// A peer id that already joined
    #[error("Peer already joined: {0}")]
    DuplicatePeer(duet_core::PeerId),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
