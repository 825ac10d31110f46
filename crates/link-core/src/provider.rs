//! # Payment Provider Trait
//!
//! Seam for hosted-checkout payment providers.
//!
//! A provider does two things for the link lifecycle: it opens a hosted
//! payment session for one attempt, and it verifies and parses the
//! asynchronous webhook notifications that settle the attempt. The lifecycle
//! controller drives everything else.

use crate::error::LinkResult;
use crate::link::PaymentLink;
use async_trait::async_trait;
use std::sync::Arc;

/// A hosted payment session created by a provider for one payment attempt
#[derive(Debug, Clone)]
pub struct ProviderSession {
    /// Provider's session id
    pub session_id: String,

    /// Opaque session payload consumed by the provider's frontend component
    pub session_data: String,

    /// The attempt reference this session was created under
    pub reference: String,

    /// Client-side key the frontend component initialises with
    pub client_key: String,
}

/// Outcome of one payment attempt, as reported by the provider webhook.
///
/// `merchant_reference` is the raw attempt reference from the wire; callers
/// strip the attempt suffix before keying into the link store.
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    /// Attempt reference as sent to the provider
    pub merchant_reference: String,

    /// Whether the payment was authorised
    pub authorised: bool,

    /// Provider-side transaction reference, if present
    pub psp_reference: Option<String>,
}

/// Core trait for payment provider implementations.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a hosted payment session for one attempt on a link.
    ///
    /// # Arguments
    /// * `link` - The link being paid
    /// * `attempt_reference` - Per-attempt reference minted by the caller
    /// * `return_url` - URL the shopper is redirected to after the attempt
    async fn create_session(
        &self,
        link: &PaymentLink,
        attempt_reference: &str,
        return_url: &str,
    ) -> LinkResult<ProviderSession>;

    /// Verify a webhook signature over the raw body.
    ///
    /// Implementations may be configured to skip verification (test setups);
    /// in that case this returns `Ok(())` unconditionally.
    fn verify_webhook(&self, payload: &[u8], signature: Option<&str>) -> LinkResult<()>;

    /// Parse a webhook payload into payment outcomes.
    ///
    /// Notification batches may contain events other than payment outcomes;
    /// those are skipped.
    fn parse_webhook(&self, payload: &[u8]) -> LinkResult<Vec<PaymentOutcome>>;

    /// Get the provider name (for logging)
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared payment provider (dynamic dispatch)
pub type BoxedPaymentProvider = Arc<dyn PaymentProvider>;
