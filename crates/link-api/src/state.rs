//! # Application State
//!
//! Shared state for the Axum application.
//! All environment-derived values live in explicitly constructed config
//! objects handed to the lifecycle controller at startup; nothing is read
//! from the environment after boot.

use crate::lifecycle::LifecycleController;
use link_adyen::AdyenSessionProvider;
use link_core::{BoxedLinkStore, BoxedPaymentProvider};
use link_store::SqliteLinkStore;
use std::sync::Arc;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Base URL embedded in generated checkout links and return URLs
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// How long a link stays locked in `processing` before auto-unlock
    pub processing_lock_secs: u64,
    /// SQLite database path
    pub database_path: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string())
                .trim_end_matches('/')
                .to_string(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            processing_lock_secs: std::env::var("PROCESSING_LOCK_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "payments.db".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address")
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Link lifecycle controller (store + provider + unlock scheduler)
    pub controller: Arc<LifecycleController>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState with the SQLite store and Adyen provider
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let store: BoxedLinkStore = Arc::new(SqliteLinkStore::open(&config.database_path)?);
        let provider: BoxedPaymentProvider = Arc::new(
            AdyenSessionProvider::from_env()
                .map_err(|e| anyhow::anyhow!("Failed to initialize Adyen: {}", e))?,
        );

        Ok(Self::with_parts(store, provider, config))
    }

    /// Assemble state from explicit parts (tests inject mocks here)
    pub fn with_parts(
        store: BoxedLinkStore,
        provider: BoxedPaymentProvider,
        config: AppConfig,
    ) -> Self {
        let controller = Arc::new(LifecycleController::new(
            store,
            provider,
            config.base_url.clone(),
            Duration::from_secs(config.processing_lock_secs),
        ));

        Self { controller, config }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults() {
        // Clear env vars for test
        std::env::remove_var("HOST");
        std::env::remove_var("PORT");
        std::env::remove_var("BASE_URL");
        std::env::remove_var("PROCESSING_LOCK_SECONDS");

        let config = AppConfig::from_env();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.processing_lock_secs, 30);
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        std::env::set_var("BASE_URL", "https://pay.example.com/");
        let config = AppConfig::from_env();
        assert_eq!(config.base_url, "https://pay.example.com");
        std::env::remove_var("BASE_URL");
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            environment: "test".to_string(),
            processing_lock_secs: 30,
            database_path: "payments.db".to_string(),
        };

        let addr = config.socket_addr();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");
    }
}
