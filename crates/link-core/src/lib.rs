//! # link-core
//!
//! Core types and traits for the payment-links service.
//!
//! This crate provides:
//! - `PaymentLink` and `LinkStatus` for the single-use link lifecycle
//! - `PaymentProvider` trait for hosted-checkout providers
//! - `LinkStore` trait for link persistence
//! - `LinkError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use link_core::{Currency, LinkStatus, PaymentLink};
//!
//! // Admin creates a single-use link
//! let link = PaymentLink::new(1099, Currency::EUR, "ORDER42", "NL", 24)?;
//! assert_eq!(link.status, LinkStatus::Pending);
//!
//! // Each payment attempt mints a derived reference for the provider
//! let attempt = link.mint_attempt_reference();
//!
//! // The webhook recovers the business reference from the attempt reference
//! assert_eq!(link_core::business_reference(&attempt), "ORDER42");
//! ```

pub mod currency;
pub mod error;
pub mod link;
pub mod provider;
pub mod store;

// Re-exports for convenience
pub use currency::Currency;
pub use error::{LinkError, LinkResult};
pub use link::{business_reference, LinkStatus, PaymentLink};
pub use provider::{BoxedPaymentProvider, PaymentOutcome, PaymentProvider, ProviderSession};
pub use store::{BoxedLinkStore, LinkStore};
