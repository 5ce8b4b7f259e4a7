//! # Wire Frames
//!
//! `u32 length (little-endian) || payload`, payload capped at 64 KiB. The
//! handshake exchanges a bare two-byte protocol version before any frame
//! flows.

use crate::errors::NetError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum frame payload (64 KiB).
pub const MAX_FRAME_PAYLOAD: usize = 64 * 1024;

/// Protocol version both peers must present.
pub const PROTOCOL_VERSION: [u8; 2] = [0x01, 0x00];

/// Encode a payload into a frame.
#[must_use]
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Write one frame to a stream.
///
/// # Errors
///
/// Returns [`NetError::FrameTooLarge`] or an io error.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    stream: &mut W,
    payload: &[u8],
) -> Result<(), NetError> {
    if payload.len() > MAX_FRAME_PAYLOAD {
        return Err(NetError::FrameTooLarge {
            len: payload.len(),
            max: MAX_FRAME_PAYLOAD,
        });
    }
    stream.write_all(&encode_frame(payload)).await?;
    stream.flush().await?;
    Ok(())
}

/// Read one frame from a stream.
///
/// # Errors
///
/// Returns [`NetError::FrameTooLarge`] for an oversized prefix or an io
/// error (including clean EOF).
pub async fn read_frame<R: AsyncRead + Unpin>(stream: &mut R) -> Result<Vec<u8>, NetError> {
    let mut length_bytes = [0u8; 4];
    stream.read_exact(&mut length_bytes).await?;
    let length = u32::from_le_bytes(length_bytes) as usize;
    if length > MAX_FRAME_PAYLOAD {
        return Err(NetError::FrameTooLarge {
            len: length,
            max: MAX_FRAME_PAYLOAD,
        });
    }
    let mut payload = vec![0u8; length];
    stream.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Run the version handshake: send ours, read theirs, require equality.
/// The connection counts as established only after both sides match.
///
/// # Errors
///
/// Returns [`NetError::VersionMismatch`] or an io error.
pub async fn handshake<S: AsyncRead + AsyncWrite + Unpin>(stream: &mut S) -> Result<(), NetError> {
    stream.write_all(&PROTOCOL_VERSION).await?;
    stream.flush().await?;

    let mut theirs = [0u8; 2];
    stream.read_exact(&mut theirs).await?;
    if theirs != PROTOCOL_VERSION {
        return Err(NetError::VersionMismatch(theirs));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_frame_layout() {
        let frame = encode_frame(b"abc");
        assert_eq!(&frame[..4], &3u32.to_le_bytes());
        assert_eq!(&frame[4..], b"abc");
    }

    #[tokio::test]
    async fn test_frame_roundtrip() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        write_frame(&mut client, b"hello peer").await.unwrap();

        let payload = read_frame(&mut server).await.unwrap();
        assert_eq!(payload, b"hello peer");
    }

    #[tokio::test]
    async fn test_oversized_write_rejected() {
        let (mut client, _server) = tokio::io::duplex(64);
        let payload = vec![0u8; MAX_FRAME_PAYLOAD + 1];
        assert!(matches!(
            write_frame(&mut client, &payload).await,
            Err(NetError::FrameTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_oversized_length_prefix_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        tokio::io::AsyncWriteExt::write_all(&mut client, &u32::MAX.to_le_bytes())
            .await
            .unwrap();
        assert!(matches!(
            read_frame(&mut server).await,
            Err(NetError::FrameTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_handshake_matching_versions() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let client_side = tokio::spawn(async move { handshake(&mut client).await });
        handshake(&mut server).await.unwrap();
        client_side.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_handshake_version_mismatch() {
        let (mut client, mut server) = tokio::io::duplex(64);
        tokio::io::AsyncWriteExt::write_all(&mut client, &[0x02, 0x00])
            .await
            .unwrap();
        assert!(matches!(
            handshake(&mut server).await,
            Err(NetError::VersionMismatch([0x02, 0x00]))
        ));
    }
}
