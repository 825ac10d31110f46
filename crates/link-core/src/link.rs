//! # Payment Link Types
//!
//! The single-use payment link and its status lifecycle.
//!
//! A link moves along `pending -> processing -> {pending, paid}`. Paid is
//! terminal. The `processing` status is an advisory, time-bounded lock that
//! prevents a shopper from opening two concurrent payment sessions for one
//! link; the webhook is the authoritative signal and may override it at any
//! time.

use crate::currency::Currency;
use crate::error::{LinkError, LinkResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a payment link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    /// Link is open for a new payment attempt
    Pending,
    /// A payment attempt is in flight (advisory lock, auto-unlocks)
    Processing,
    /// Payment confirmed by the provider webhook; terminal
    Paid,
}

impl LinkStatus {
    /// Returns the status as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Pending => "pending",
            LinkStatus::Processing => "processing",
            LinkStatus::Paid => "paid",
        }
    }

    /// Parse a stored status string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(LinkStatus::Pending),
            "processing" => Some(LinkStatus::Processing),
            "paid" => Some(LinkStatus::Paid),
            _ => None,
        }
    }

    /// Paid links never leave their status
    pub fn is_terminal(&self) -> bool {
        matches!(self, LinkStatus::Paid)
    }
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single-use payment link
///
/// `status` is the only mutable field; everything else is fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentLink {
    /// Opaque unique link id (generated)
    pub id: String,

    /// Amount in currency minor units
    pub amount_minor: i64,

    /// Currency (ISO 4217)
    pub currency: Currency,

    /// Merchant-supplied business reference, globally unique
    pub reference: String,

    /// Link status
    pub status: LinkStatus,

    /// Shopper country (ISO 3166-1 alpha-2)
    pub country: String,

    /// Absolute expiry timestamp (creation time + admin-supplied TTL)
    pub expires_at: DateTime<Utc>,
}

impl PaymentLink {
    /// Create a new pending link with a generated id.
    ///
    /// The reference must be non-empty and must not contain `_`: attempt
    /// references are derived as `{reference}_{suffix}` and the webhook
    /// recovers the business reference by splitting at the first underscore.
    pub fn new(
        amount_minor: i64,
        currency: Currency,
        reference: impl Into<String>,
        country: impl Into<String>,
        expires_hours: i64,
    ) -> LinkResult<Self> {
        let reference = reference.into();
        let country = country.into();

        if amount_minor <= 0 {
            return Err(LinkError::InvalidRequest(
                "Amount must be positive".to_string(),
            ));
        }
        if reference.is_empty() {
            return Err(LinkError::InvalidRequest(
                "Reference must not be empty".to_string(),
            ));
        }
        if reference.contains('_') {
            return Err(LinkError::InvalidRequest(
                "Reference must not contain '_' (reserved for attempt suffixes)".to_string(),
            ));
        }
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(LinkError::InvalidRequest(format!(
                "Country must be a two-letter ISO code, got: {}",
                country
            )));
        }
        if expires_hours <= 0 {
            return Err(LinkError::InvalidRequest(
                "Expiry must be at least one hour".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            amount_minor,
            currency,
            reference,
            status: LinkStatus::Pending,
            country: country.to_uppercase(),
            expires_at: Utc::now() + Duration::hours(expires_hours),
        })
    }

    /// Check whether the link has passed its expiry timestamp
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// A link can start a new payment attempt only while pending and unexpired
    pub fn is_payable(&self, now: DateTime<Utc>) -> bool {
        self.status == LinkStatus::Pending && !self.is_expired(now)
    }

    /// Mint a provider-side reference for one payment attempt.
    ///
    /// Attempt references keep provider-side ids unique across retries while
    /// letting the webhook recover the business reference (see
    /// [`business_reference`]).
    pub fn mint_attempt_reference(&self) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}_{}", self.reference, &suffix[..8])
    }
}

/// Recover the business reference from an attempt reference by stripping the
/// per-attempt suffix (everything from the first `_`).
pub fn business_reference(attempt_reference: &str) -> &str {
    attempt_reference
        .split('_')
        .next()
        .unwrap_or(attempt_reference)
}
