//! Length-prefixed bincode framing.
//!
//! Frames are a 4-byte big-endian length followed by the bincode-encoded
//! [`Message`]. A length guard caps frames so a bad peer cannot make us
//! allocate unbounded memory.

use crate::Message;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on a single frame's payload.
pub const MAX_FRAME_LEN: u32 = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("frame length {len} exceeds limit {MAX_FRAME_LEN}")]
    FrameTooLarge { len: u32 },
}

/// Write one framed message.
pub async fn write_message<W>(writer: &mut W, message: &Message) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    let payload = bincode::serialize(message)?;
    let len = payload.len() as u32;
    if len > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge { len });
    }
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one framed message. Returns `Ok(None)` on a clean EOF before the
/// length prefix.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Message>, WireError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge { len });
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    let message = bincode::deserialize(&payload)?;
    Ok(Some(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use peershare_types::PeerInfo;
    use std::io::Cursor;

    fn peer() -> PeerInfo {
        PeerInfo::new("node-8000", "127.0.0.1:8000", 0.9, 0.8)
    }

    #[tokio::test]
    async fn frame_roundtrip() {
        let mut buf = Vec::new();
        write_message(&mut buf, &Message::NodeInfo(peer())).await.unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded = read_message(&mut cursor).await.unwrap().unwrap();
        match decoded {
            Message::NodeInfo(p) => assert_eq!(p.id, "node-8000"),
            other => panic!("expected NodeInfo, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn multiple_frames_in_sequence() {
        let mut buf = Vec::new();
        write_message(&mut buf, &Message::GetNodeInfo).await.unwrap();
        write_message(&mut buf, &Message::RotationCount(3)).await.unwrap();

        let mut cursor = Cursor::new(buf);
        assert!(matches!(
            read_message(&mut cursor).await.unwrap(),
            Some(Message::GetNodeInfo)
        ));
        assert!(matches!(
            read_message(&mut cursor).await.unwrap(),
            Some(Message::RotationCount(3))
        ));
        assert!(read_message(&mut cursor).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clean_eof_yields_none() {
        let mut cursor = Cursor::new(Vec::new());
        assert!(read_message(&mut cursor).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn truncated_payload_is_an_error() {
        let mut buf = Vec::new();
        write_message(&mut buf, &Message::NodeInfo(peer())).await.unwrap();
        buf.truncate(buf.len() - 2);

        let mut cursor = Cursor::new(buf);
        assert!(read_message(&mut cursor).await.is_err());
    }

    #[tokio::test]
    async fn oversized_length_prefix_rejected() {
        let len = MAX_FRAME_LEN + 1;
        let mut buf = len.to_be_bytes().to_vec();
        buf.extend_from_slice(&[0u8; 8]);

        let mut cursor = Cursor::new(buf);
        match read_message(&mut cursor).await {
            Err(WireError::FrameTooLarge { len: l }) => assert_eq!(l, len),
            other => panic!("expected FrameTooLarge, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn garbage_payload_is_a_codec_error() {
        let payload = [0xFFu8; 6];
        let mut buf = (payload.len() as u32).to_be_bytes().to_vec();
        buf.extend_from_slice(&payload);

        let mut cursor = Cursor::new(buf);
        assert!(matches!(
            read_message(&mut cursor).await,
            Err(WireError::Codec(_))
        ));
    }
}
