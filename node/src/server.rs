//! TCP listener: one connection, one message.

use crate::context::NodeContext;
use crate::dispatcher;
use peershare_messages::{read_message, write_message};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::Receiver;
use tracing::{debug, info, warn};

/// Accept connections until shutdown. Each connection carries one framed
/// message; only `GetNodeInfo` gets a reply on the same connection.
pub async fn run(ctx: Arc<NodeContext>, listener: TcpListener, mut shutdown: Receiver<()>) {
    info!(addr = %ctx.config.addr(), "listening");
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                info!("listener stopping");
                return;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, remote)) => {
                        let ctx = Arc::clone(&ctx);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(&ctx, stream).await {
                                debug!(%remote, error = %e, "connection failed");
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                }
            }
        }
    }
}

async fn handle_connection(
    ctx: &NodeContext,
    mut stream: TcpStream,
) -> Result<(), crate::NodeError> {
    let Some(message) = read_message(&mut stream).await? else {
        return Ok(());
    };
    debug!(kind = message.kind(), "message received");
    if let Some(reply) = dispatcher::dispatch(ctx, message).await? {
        write_message(&mut stream, &reply).await?;
    }
    Ok(())
}
