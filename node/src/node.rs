//! The node facade: wiring, lifecycle, user actions.

use crate::config::NodeConfig;
use crate::context::{Collaborators, NodeContext};
use crate::error::NodeError;
use crate::shutdown::ShutdownController;
use crate::{driver, server, transfer};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

/// A running peershare node: TCP listener plus the periodic cycle driver.
pub struct PeerNode {
    ctx: Arc<NodeContext>,
    shutdown: ShutdownController,
    tasks: Vec<JoinHandle<()>>,
}

impl PeerNode {
    pub fn new(config: NodeConfig, collaborators: Collaborators) -> Self {
        Self {
            ctx: NodeContext::new(config, collaborators),
            shutdown: ShutdownController::new(),
            tasks: Vec::new(),
        }
    }

    pub fn context(&self) -> &Arc<NodeContext> {
        &self.ctx
    }

    pub fn shutdown_controller(&self) -> &ShutdownController {
        &self.shutdown
    }

    /// Bind the listener and spawn the server and driver tasks.
    pub async fn start(&mut self) -> Result<(), NodeError> {
        let listener = TcpListener::bind(self.ctx.config.addr()).await?;
        info!(id = %self.ctx.node_id(), addr = %self.ctx.config.addr(), "node starting");

        let server_ctx = Arc::clone(&self.ctx);
        let server_shutdown = self.shutdown.subscribe();
        self.tasks.push(tokio::spawn(async move {
            server::run(server_ctx, listener, server_shutdown).await;
        }));

        let driver_ctx = Arc::clone(&self.ctx);
        let driver_shutdown = self.shutdown.subscribe();
        self.tasks.push(tokio::spawn(async move {
            driver::run(driver_ctx, driver_shutdown).await;
        }));
        Ok(())
    }

    /// Signal shutdown and wait for the tasks to finish.
    pub async fn stop(&mut self) {
        self.shutdown.shutdown();
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        info!(id = %self.ctx.node_id(), "node stopped");
    }

    /// Upload a file: encrypt, store, propose to group consensus.
    pub async fn upload(&self, path: &Path) -> Result<u64, NodeError> {
        transfer::upload(&self.ctx, path).await
    }

    /// Share an uploaded file (by its transaction block index) with a peer.
    pub async fn share(&self, index: u64, receiver_id: &str) -> Result<u64, NodeError> {
        transfer::share(&self.ctx, index, receiver_id).await
    }
}
