//! Shared node context handed to every task.

use crate::clock::Clock;
use crate::config::NodeConfig;
use crate::state::NodeState;
use peershare_crypto::{Encryptor, KeyStore, Signer};
use peershare_network::Discovery;
use peershare_store::BlobStore;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The pluggable collaborators a node is wired with.
///
/// Real deployments supply real cryptography and storage; tests and the dev
/// daemon use the nullable implementations.
pub struct Collaborators {
    pub signer: Arc<dyn Signer>,
    pub encryptor: Arc<dyn Encryptor>,
    pub key_store: Arc<dyn KeyStore>,
    pub blob_store: Arc<dyn BlobStore>,
    pub discovery: Arc<dyn Discovery>,
    pub clock: Arc<dyn Clock>,
}

/// Everything the server, driver and CLI flows share.
///
/// `state` is the single serialization point: take the lock, mutate, collect
/// the peers to contact, release, then do network I/O.
pub struct NodeContext {
    pub config: NodeConfig,
    pub state: Mutex<NodeState>,
    pub signer: Arc<dyn Signer>,
    pub encryptor: Arc<dyn Encryptor>,
    pub key_store: Arc<dyn KeyStore>,
    pub blob_store: Arc<dyn BlobStore>,
    pub discovery: Arc<dyn Discovery>,
    pub clock: Arc<dyn Clock>,
}

impl NodeContext {
    pub fn new(config: NodeConfig, collaborators: Collaborators) -> Arc<Self> {
        Arc::new(Self {
            config,
            state: Mutex::new(NodeState::new()),
            signer: collaborators.signer,
            encryptor: collaborators.encryptor,
            key_store: collaborators.key_store,
            blob_store: collaborators.blob_store,
            discovery: collaborators.discovery,
            clock: collaborators.clock,
        })
    }

    pub fn node_id(&self) -> &str {
        &self.config.node_id
    }
}
