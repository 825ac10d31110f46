//! # Adyen Checkout Sessions
//!
//! Implementation of the Adyen Checkout Sessions API.
//! One session is created per payment attempt on a link; the session id and
//! session data feed the Drop-in component on the hosted checkout page.

use crate::config::AdyenConfig;
use crate::webhook;
use async_trait::async_trait;
use link_core::{
    LinkError, LinkResult, PaymentLink, PaymentOutcome, PaymentProvider, ProviderSession,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

/// Checkout API version the session endpoint is pinned to
const CHECKOUT_API_VERSION: &str = "v70";

/// Adyen Checkout Sessions provider
///
/// Uses Adyen's hosted Drop-in flow: the server creates a session, the
/// frontend component collects payment details, and the webhook settles the
/// outcome asynchronously.
pub struct AdyenSessionProvider {
    config: AdyenConfig,
    client: Client,
}

impl AdyenSessionProvider {
    /// Create a new Adyen session provider
    pub fn new(config: AdyenConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Create from environment variables
    pub fn from_env() -> LinkResult<Self> {
        let config = AdyenConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// Access the configuration (client key, merchant account)
    pub fn config(&self) -> &AdyenConfig {
        &self.config
    }
}

#[async_trait]
impl PaymentProvider for AdyenSessionProvider {
    #[instrument(skip(self, link), fields(payment_id = %link.id, reference = %attempt_reference))]
    async fn create_session(
        &self,
        link: &PaymentLink,
        attempt_reference: &str,
        return_url: &str,
    ) -> LinkResult<ProviderSession> {
        let request = AdyenSessionRequest {
            amount: AdyenAmount {
                value: link.amount_minor,
                currency: link.currency.as_str(),
            },
            reference: attempt_reference,
            merchant_account: &self.config.merchant_account,
            return_url,
            country_code: &link.country,
        };

        debug!(
            amount = link.amount_minor,
            currency = %link.currency,
            country = %link.country,
            "Creating Adyen checkout session"
        );

        let url = format!(
            "{}/{}/sessions",
            self.config.api_base_url, CHECKOUT_API_VERSION
        );

        let response = self
            .client
            .post(&url)
            .header("X-API-Key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LinkError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LinkError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Adyen API error: status={}, body={}", status, body);

            // Parse Adyen error
            if let Ok(error_response) = serde_json::from_str::<AdyenErrorResponse>(&body) {
                return Err(LinkError::ProviderError {
                    provider: "adyen".to_string(),
                    message: error_response.message,
                });
            }

            return Err(LinkError::ProviderError {
                provider: "adyen".to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let session_response: AdyenSessionResponse = serde_json::from_str(&body)
            .map_err(|e| LinkError::Serialization(format!("Failed to parse Adyen response: {}", e)))?;

        info!(
            "Created Adyen session: id={}, reference={}",
            session_response.id, attempt_reference
        );

        Ok(ProviderSession {
            session_id: session_response.id,
            session_data: session_response.session_data,
            reference: attempt_reference.to_string(),
            client_key: self.config.client_key.clone(),
        })
    }

    fn verify_webhook(&self, payload: &[u8], signature: Option<&str>) -> LinkResult<()> {
        if self.config.skip_hmac_validation {
            warn!("SKIPPING HMAC VALIDATION (SKIP_HMAC_VALIDATION=true)");
            return Ok(());
        }

        let hmac_key = self.config.hmac_key.as_deref().ok_or_else(|| {
            LinkError::Configuration("ADYEN_HMAC_KEY not set".to_string())
        })?;

        let signature = signature.ok_or_else(|| {
            LinkError::WebhookVerificationFailed("Missing Hmac-Signature header".to_string())
        })?;

        webhook::verify_signature(hmac_key, payload, signature)
    }

    fn parse_webhook(&self, payload: &[u8]) -> LinkResult<Vec<PaymentOutcome>> {
        webhook::parse_notification(payload)
    }

    fn provider_name(&self) -> &'static str {
        "adyen"
    }
}

// =============================================================================
// Adyen API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct AdyenSessionRequest<'a> {
    amount: AdyenAmount<'a>,
    reference: &'a str,
    #[serde(rename = "merchantAccount")]
    merchant_account: &'a str,
    #[serde(rename = "returnUrl")]
    return_url: &'a str,
    #[serde(rename = "countryCode")]
    country_code: &'a str,
}

#[derive(Debug, Serialize)]
struct AdyenAmount<'a> {
    value: i64,
    currency: &'a str,
}

#[derive(Debug, Deserialize)]
struct AdyenSessionResponse {
    id: String,
    #[serde(rename = "sessionData")]
    session_data: String,
}

#[derive(Debug, Deserialize)]
struct AdyenErrorResponse {
    message: String,
    #[serde(default, rename = "errorCode")]
    error_code: Option<String>,
    #[serde(default)]
    status: Option<u16>,
}
