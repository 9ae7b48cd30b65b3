//! Binary entrypoint for the tactivo HTTP server.
//!
//! Configuration comes from environment variables, see
//! [`tactivo_server::config`].

use tactivo_server::config::ServerConfig;
use tactivo_server::router::build_router;
use tactivo_server::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env()?;
    let state = AppState::new(&config)?;

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("tactivo server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
