//! # Link Store Trait
//!
//! Persistence seam for payment links: one record per link, keyed by id with
//! a unique business reference.
//!
//! Status writes that participate in races (timer vs. webhook vs. shopper)
//! are expressed as atomic conditional updates so a lost update can never
//! move a link to a state its current status forbids.

use crate::error::LinkResult;
use crate::link::{LinkStatus, PaymentLink};
use async_trait::async_trait;
use std::sync::Arc;

/// Persistence operations for payment links
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Insert a new link.
    ///
    /// Fails with `DuplicateReference` if the business reference is taken.
    async fn create(&self, link: &PaymentLink) -> LinkResult<()>;

    /// Fetch a link by id
    async fn get_by_id(&self, id: &str) -> LinkResult<Option<PaymentLink>>;

    /// Fetch a link by business reference
    async fn get_by_reference(&self, reference: &str) -> LinkResult<Option<PaymentLink>>;

    /// Overwrite the status of a link by id; no-op if the id is absent
    async fn update_status_by_id(&self, id: &str, status: LinkStatus) -> LinkResult<()>;

    /// Overwrite the status of a link by business reference; no-op if absent
    async fn update_status_by_reference(
        &self,
        reference: &str,
        status: LinkStatus,
    ) -> LinkResult<()>;

    /// Atomically move a link from `from` to `to`.
    ///
    /// Returns `true` if the row was updated, `false` if the link was absent
    /// or its status no longer matched `from`.
    async fn transition_status(
        &self,
        id: &str,
        from: LinkStatus,
        to: LinkStatus,
    ) -> LinkResult<bool>;

    /// Settle a link from a webhook outcome, keyed by business reference.
    ///
    /// An authorised outcome marks the link paid from any status. A declined
    /// outcome releases the processing lock back to pending, but never
    /// demotes a paid link. Returns `true` if a row changed.
    async fn settle_by_reference(&self, reference: &str, authorised: bool) -> LinkResult<bool>;
}

/// Type alias for a shared link store (dynamic dispatch)
pub type BoxedLinkStore = Arc<dyn LinkStore>;
