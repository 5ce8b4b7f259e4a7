//! Error types for the transport.

use std::net::SocketAddr;
use thiserror::Error;

/// Errors from P2P operations.
#[derive(Debug, Error)]
pub enum NetError {
    /// Peer spoke a different protocol version.
    #[error("version mismatch: peer sent {0:02X?}")]
    VersionMismatch([u8; 2]),

    /// Frame length prefix exceeded the payload cap.
    #[error("frame too large: {len} > {max}")]
    FrameTooLarge {
        /// Declared payload length.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// No connection to the peer.
    #[error("peer unavailable: {0}")]
    PeerUnavailable(SocketAddr),

    /// Underlying socket failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame payload did not decode into a message.
    #[error("malformed message")]
    MalformedMessage,
}
