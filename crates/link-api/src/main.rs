//! # Payment-Links
//!
//! Single-use payment links over Adyen hosted checkout.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export ADYEN_API_KEY=...
//! export ADYEN_MERCHANT_ACCOUNT=...
//! export ADYEN_CLIENT_KEY=...
//! export ADYEN_HMAC_KEY=...
//!
//! # Run the server
//! payment-links
//! ```

use link_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr();
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Base URL: {}", state.config.base_url);
    info!(
        "Processing lock: {}s, database: {}",
        state.config.processing_lock_secs, state.config.database_path
    );

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("Payment-links starting on http://{}", addr);

    if !is_prod {
        info!("Admin form: http://{}/admin", addr);
        info!("Webhook: POST http://{}/webhook", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
