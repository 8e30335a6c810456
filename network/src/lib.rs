//! Networking: who the peers are, how we find them and how we talk to them.
//!
//! Connections are one-shot: open, send one framed message (optionally read
//! one reply), close. Nothing here holds long-lived streams; a peer that
//! cannot be reached is simply absent this cycle.

pub mod client;
pub mod discovery;
pub mod registry;

pub use client::{broadcast, request_node_info, send_message, BroadcastResult};
pub use discovery::{Discovery, PortScanDiscovery};
pub use registry::PeerRegistry;

use peershare_messages::WireError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("timed out connecting to {addr}")]
    ConnectTimeout { addr: String },

    #[error("peer {addr} closed the connection without replying")]
    NoReply { addr: String },
}
