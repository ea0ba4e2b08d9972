//! HTTP server lifecycle.
//!
//! Binds the configured address, mounts [`api_router`] and runs until
//! the process is stopped.

use std::net::SocketAddr;

use crate::api::router::api_router;
use crate::api::types::ApiContext;

/// Bind and serve the API. Runs until the task is cancelled.
pub async fn serve(addr: SocketAddr, ctx: ApiContext) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound = listener.local_addr()?;
    tracing::info!(%bound, "listening");

    axum::serve(listener, api_router(ctx)).await
}
