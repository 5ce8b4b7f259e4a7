//! # Messages
//!
//! Frame payloads. Keep-alive probes are the literal 4-byte ASCII strings
//! `PING` and `PONG`; everything else is a tag byte followed by opaque
//! bytes the higher layers decode.

use crate::errors::NetError;
use std::net::SocketAddr;

const PING: &[u8; 4] = b"PING";
const PONG: &[u8; 4] = b"PONG";

const TAG_TRANSACTION: u8 = 0x01;
const TAG_BATCH_PROOF: u8 = 0x02;
const TAG_TRANSITION_PROOF: u8 = 0x03;
const TAG_EXIT_PROOF: u8 = 0x04;

/// A message exchanged between peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetMessage {
    /// Keep-alive probe.
    Ping,
    /// Keep-alive response.
    Pong,
    /// A serialized transaction.
    Transaction(Vec<u8>),
    /// A serialized consensus batch proof.
    BatchProof(Vec<u8>),
    /// A serialized state transition proof.
    TransitionProof(Vec<u8>),
    /// A serialized emergency-exit proof.
    ExitProof(Vec<u8>),
}

impl NetMessage {
    /// Encode into a frame payload.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Ping => PING.to_vec(),
            Self::Pong => PONG.to_vec(),
            Self::Transaction(bytes) => tag_payload(TAG_TRANSACTION, bytes),
            Self::BatchProof(bytes) => tag_payload(TAG_BATCH_PROOF, bytes),
            Self::TransitionProof(bytes) => tag_payload(TAG_TRANSITION_PROOF, bytes),
            Self::ExitProof(bytes) => tag_payload(TAG_EXIT_PROOF, bytes),
        }
    }

    /// Decode a frame payload.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::MalformedMessage`] for unknown tags or empty
    /// payloads.
    pub fn decode(payload: &[u8]) -> Result<Self, NetError> {
        if payload == PING {
            return Ok(Self::Ping);
        }
        if payload == PONG {
            return Ok(Self::Pong);
        }
        let (&tag, rest) = payload.split_first().ok_or(NetError::MalformedMessage)?;
        match tag {
            TAG_TRANSACTION => Ok(Self::Transaction(rest.to_vec())),
            TAG_BATCH_PROOF => Ok(Self::BatchProof(rest.to_vec())),
            TAG_TRANSITION_PROOF => Ok(Self::TransitionProof(rest.to_vec())),
            TAG_EXIT_PROOF => Ok(Self::ExitProof(rest.to_vec())),
            _ => Err(NetError::MalformedMessage),
        }
    }
}

fn tag_payload(tag: u8, bytes: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(1 + bytes.len());
    payload.push(tag);
    payload.extend_from_slice(bytes);
    payload
}

/// Events surfaced to the transport consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetEvent {
    /// Handshake completed with a peer.
    PeerConnected(SocketAddr),
    /// A peer went away (close, error or keep-alive timeout).
    PeerDisconnected(SocketAddr),
    /// An application message arrived.
    Message {
        /// Sending peer.
        from: SocketAddr,
        /// Decoded message.
        message: NetMessage,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keepalive_is_ascii() {
        assert_eq!(NetMessage::Ping.encode(), b"PING");
        assert_eq!(NetMessage::Pong.encode(), b"PONG");
    }

    #[test]
    fn test_roundtrip_all_variants() {
        let messages = [
            NetMessage::Ping,
            NetMessage::Pong,
            NetMessage::Transaction(vec![1, 2, 3]),
            NetMessage::BatchProof(vec![4]),
            NetMessage::TransitionProof(Vec::new()),
            NetMessage::ExitProof(vec![9; 40]),
        ];
        for message in messages {
            assert_eq!(NetMessage::decode(&message.encode()).unwrap(), message);
        }
    }

    #[test]
    fn test_unknown_tag_rejected() {
        assert!(matches!(
            NetMessage::decode(&[0xEE, 1, 2]),
            Err(NetError::MalformedMessage)
        ));
        assert!(matches!(
            NetMessage::decode(&[]),
            Err(NetError::MalformedMessage)
        ));
    }
}
