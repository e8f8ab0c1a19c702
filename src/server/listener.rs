use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::http::connection::Connection;
use crate::proxy::{ProxyHandler, TracingRequestLog};

/// Binds the configured address and serves until the task is dropped.
pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let mapping = cfg.mapping()?;
    let listener = TcpListener::bind(&cfg.server.listen_addr).await?;
    info!(
        "Listening on {} ({} -> {})",
        cfg.server.listen_addr,
        mapping.listen_prefix(),
        mapping.target_prefix()
    );

    let handler = ProxyHandler::new(mapping, Some(Arc::new(TracingRequestLog)));
    serve(listener, Arc::new(handler)).await
}

/// Accepts connections forever, one task each.
pub async fn serve(listener: TcpListener, handler: Arc<ProxyHandler>) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Accepted connection from {}", peer);

        let handler = handler.clone();
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, peer, handler);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
