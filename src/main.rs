use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kommo_capi_relay::config::Config;
use kommo_capi_relay::handlers::AppState;

/// Main entry point for the application.
///
/// Initializes logging, loads configuration, builds the Kommo and Conversions
/// API clients and starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kommo_capi_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let port = config.port;

    let app_state = Arc::new(AppState::new(config)?);
    tracing::info!("✓ Kommo and Conversions API clients initialized");

    let app = kommo_capi_relay::app(app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Connect info feeds the client IP fallback when no X-Forwarded-For is sent
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
