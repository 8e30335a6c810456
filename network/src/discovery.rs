//! Peer discovery.

use crate::client::request_node_info;
use async_trait::async_trait;
use peershare_types::PeerInfo;
use std::ops::RangeInclusive;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, trace};

/// How a node finds its peers. One implementation ships (the port scan);
/// tests substitute fixed peer lists.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Find reachable peers, excluding the node itself.
    async fn discover(&self) -> Vec<PeerInfo>;
}

/// Scans a contiguous local port range, asking every port that accepts a
/// connection for its node info.
///
/// Unreachable ports are skipped silently; the node's own port is never
/// probed.
pub struct PortScanDiscovery {
    host: String,
    ports: RangeInclusive<u16>,
    own_port: u16,
    connect_timeout: Duration,
}

impl PortScanDiscovery {
    pub fn new(
        host: impl Into<String>,
        ports: RangeInclusive<u16>,
        own_port: u16,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            host: host.into(),
            ports,
            own_port,
            connect_timeout,
        }
    }
}

#[async_trait]
impl Discovery for PortScanDiscovery {
    async fn discover(&self) -> Vec<PeerInfo> {
        let mut probes = JoinSet::new();
        for port in self.ports.clone() {
            if port == self.own_port {
                continue;
            }
            let addr = format!("{}:{port}", self.host);
            let connect_timeout = self.connect_timeout;
            probes.spawn(async move {
                match request_node_info(&addr, connect_timeout).await {
                    Ok(peer) => Some(peer),
                    Err(e) => {
                        trace!(%addr, error = %e, "port not answering");
                        None
                    }
                }
            });
        }

        let mut peers = Vec::new();
        while let Some(joined) = probes.join_next().await {
            if let Ok(Some(peer)) = joined {
                peers.push(peer);
            }
        }
        debug!(found = peers.len(), "discovery round finished");
        peers
    }
}
