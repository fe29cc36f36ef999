//! Server startup

use shared::BackendConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::{router, InvoiceStore};

/// Serve the invoice API on `config.port` until ctrl-c
pub async fn serve(config: BackendConfig, store: Arc<dyn InvoiceStore>) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    serve_on(listener, config, store).await
}

/// Serve the invoice API on an already bound listener until ctrl-c
pub async fn serve_on(
    listener: TcpListener,
    config: BackendConfig,
    store: Arc<dyn InvoiceStore>,
) -> std::io::Result<()> {
    let local = listener.local_addr()?;
    let app = router(store, &config);

    info!(addr = %local, "PayBridge Backend running");
    info!("Health check: http://localhost:{}/api/health", local.port());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
}
