//! # Adyen Configuration
//!
//! Configuration management for the Adyen integration.
//! All secrets are loaded from environment variables.

use link_core::LinkError;
use std::env;

const TEST_API_BASE_URL: &str = "https://checkout-test.adyen.com";

/// Adyen API configuration
#[derive(Debug, Clone)]
pub struct AdyenConfig {
    /// Checkout API key
    pub api_key: String,

    /// Merchant account the sessions are created under
    pub merchant_account: String,

    /// Client key consumed by the Drop-in frontend component
    pub client_key: String,

    /// Webhook HMAC key (base64), if HMAC validation is enabled
    pub hmac_key: Option<String>,

    /// Skip webhook HMAC validation (local testing only)
    pub skip_hmac_validation: bool,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,
}

impl AdyenConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `ADYEN_API_KEY`
    /// - `ADYEN_MERCHANT_ACCOUNT`
    /// - `ADYEN_CLIENT_KEY`
    ///
    /// Optional:
    /// - `ADYEN_HMAC_KEY` (required unless `SKIP_HMAC_VALIDATION=true`)
    /// - `SKIP_HMAC_VALIDATION`
    pub fn from_env() -> Result<Self, LinkError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_key = env::var("ADYEN_API_KEY")
            .map_err(|_| LinkError::Configuration("ADYEN_API_KEY not set".to_string()))?;

        let merchant_account = env::var("ADYEN_MERCHANT_ACCOUNT")
            .map_err(|_| LinkError::Configuration("ADYEN_MERCHANT_ACCOUNT not set".to_string()))?;

        let client_key = env::var("ADYEN_CLIENT_KEY")
            .map_err(|_| LinkError::Configuration("ADYEN_CLIENT_KEY not set".to_string()))?;

        let hmac_key = env::var("ADYEN_HMAC_KEY").ok().filter(|k| !k.is_empty());

        let skip_hmac_validation = env::var("SKIP_HMAC_VALIDATION")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        if !skip_hmac_validation && hmac_key.is_none() {
            return Err(LinkError::Configuration(
                "ADYEN_HMAC_KEY not set (or set SKIP_HMAC_VALIDATION=true)".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            merchant_account,
            client_key,
            hmac_key,
            skip_hmac_validation,
            api_base_url: TEST_API_BASE_URL.to_string(),
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(
        api_key: impl Into<String>,
        merchant_account: impl Into<String>,
        client_key: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            merchant_account: merchant_account.into(),
            client_key: client_key.into(),
            hmac_key: None,
            skip_hmac_validation: true,
            api_base_url: TEST_API_BASE_URL.to_string(),
        }
    }

    /// Builder: set the webhook HMAC key and enable validation
    pub fn with_hmac_key(mut self, key: impl Into<String>) -> Self {
        self.hmac_key = Some(key.into());
        self.skip_hmac_validation = false;
        self
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Check if pointed at the Adyen test platform
    pub fn is_test_platform(&self) -> bool {
        self.api_base_url.contains("-test.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_config_skips_hmac() {
        let config = AdyenConfig::new("key", "MerchantAccount", "client");
        assert!(config.skip_hmac_validation);
        assert!(config.hmac_key.is_none());
        assert!(config.is_test_platform());
    }

    #[test]
    fn test_with_hmac_key_enables_validation() {
        let config = AdyenConfig::new("key", "MerchantAccount", "client").with_hmac_key("c2VjcmV0");
        assert!(!config.skip_hmac_validation);
        assert_eq!(config.hmac_key.as_deref(), Some("c2VjcmV0"));
    }

    #[test]
    fn test_from_env_missing_key() {
        env::remove_var("ADYEN_API_KEY");

        let result = AdyenConfig::from_env();
        assert!(result.is_err());
    }
}
