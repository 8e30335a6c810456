//! One-shot outbound connections.

use crate::NetworkError;
use peershare_messages::{read_message, write_message, Message};
use peershare_types::PeerInfo;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Outcome of a broadcast attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BroadcastResult {
    pub sent: usize,
    pub failed: usize,
}

async fn connect(addr: &str, connect_timeout: Duration) -> Result<TcpStream, NetworkError> {
    match timeout(connect_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(NetworkError::ConnectTimeout {
            addr: addr.to_string(),
        }),
    }
}

/// Connect, send one message, close.
pub async fn send_message(
    addr: &str,
    message: &Message,
    connect_timeout: Duration,
) -> Result<(), NetworkError> {
    let mut stream = connect(addr, connect_timeout).await?;
    write_message(&mut stream, message).await?;
    Ok(())
}

/// Connect, send `GetNodeInfo`, read the `NodeInfo` reply, close.
///
/// Any reply other than `NodeInfo` counts as no reply.
pub async fn request_node_info(
    addr: &str,
    connect_timeout: Duration,
) -> Result<PeerInfo, NetworkError> {
    let mut stream = connect(addr, connect_timeout).await?;
    write_message(&mut stream, &Message::GetNodeInfo).await?;
    match timeout(connect_timeout, read_message(&mut stream)).await {
        Ok(Ok(Some(Message::NodeInfo(peer)))) => Ok(peer),
        Ok(Ok(_)) => Err(NetworkError::NoReply {
            addr: addr.to_string(),
        }),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(NetworkError::ConnectTimeout {
            addr: addr.to_string(),
        }),
    }
}

/// Send one message to every target, skipping peers that fail.
///
/// A peer-level failure never aborts the rest of the broadcast.
pub async fn broadcast(
    targets: &[PeerInfo],
    message: &Message,
    connect_timeout: Duration,
) -> BroadcastResult {
    let mut result = BroadcastResult::default();
    for peer in targets {
        match send_message(&peer.addr, message, connect_timeout).await {
            Ok(()) => result.sent += 1,
            Err(e) => {
                debug!(peer = %peer, error = %e, kind = message.kind(), "broadcast target skipped");
                result.failed += 1;
            }
        }
    }
    result
}
