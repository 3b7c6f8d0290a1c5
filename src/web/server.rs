//! HTTP server startup.

use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::web::handlers::AppState;
use crate::web::router::create_router;
use crate::Result;

/// Bind and serve the admin API until the process is stopped.
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "admin API listening");

    let router = create_router(state);
    axum::serve(listener, router).await?;
    Ok(())
}
