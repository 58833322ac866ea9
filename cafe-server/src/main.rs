//! cafe-server binary

use cafe_server::error::BoxError;
use cafe_server::{AppState, Config, api, logger};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    logger::init_logger(
        config.log_level.as_deref(),
        config.log_json,
        config.log_dir.as_deref(),
    );

    tracing::info!(
        environment = %config.environment,
        timeout_ms = config.request_timeout.as_millis() as u64,
        "Starting cafe-server"
    );

    let state = AppState::connect(&config).await?;
    let app = api::build_app(state);

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("cafe-server HTTP listening on {http_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("cafe-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
