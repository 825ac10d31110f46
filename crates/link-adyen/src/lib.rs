//! # link-adyen
//!
//! Adyen hosted-checkout provider for the payment-links service.
//!
//! Implements the `PaymentProvider` trait on top of two Adyen surfaces:
//!
//! 1. **Checkout Sessions API** - creates a hosted session per payment
//!    attempt; the returned session id/data feed the Drop-in component on the
//!    checkout page.
//! 2. **Standard webhooks** - `AUTHORISATION` notifications settle the
//!    attempt; an optional HMAC-SHA256 signature over the raw body is
//!    verified before any notification is trusted.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use link_adyen::AdyenSessionProvider;
//! use link_core::PaymentProvider;
//!
//! // Create provider from environment
//! let provider = AdyenSessionProvider::from_env()?;
//!
//! // Create a session for one attempt
//! let session = provider.create_session(&link, &attempt_ref, &return_url).await?;
//!
//! // Render the Drop-in page with session.session_id / session.session_data
//! ```

pub mod config;
pub mod sessions;
pub mod webhook;

// Re-exports
pub use config::AdyenConfig;
pub use sessions::AdyenSessionProvider;
pub use webhook::{parse_notification, sign_payload, verify_signature, SIGNATURE_HEADER};
