//! # Link Lifecycle Controller
//!
//! Enforces the allowed state transitions of a payment link in response to
//! its three external triggers: the shopper visiting checkout, the shopper
//! returning from redirect, and the provider webhook. Owns the auto-unlock
//! scheduler.
//!
//! The `processing` lock is advisory and time-bounded: it only exists to stop
//! a shopper opening two concurrent payment sessions for one link. The
//! webhook is the authoritative signal and always wins - an unlock task is
//! cancelled when the webhook resolves the link, and a task that fires late
//! no-ops because its conditional update no longer matches.

use link_core::{
    business_reference, BoxedLinkStore, BoxedPaymentProvider, Currency, LinkError, LinkResult,
    LinkStatus, PaymentLink, ProviderSession,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// One-shot auto-unlock tasks, keyed by link id.
///
/// Arming a link replaces (and aborts) any task already scheduled for it;
/// resolving a link cancels its task outright.
pub struct UnlockScheduler {
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl UnlockScheduler {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Schedule an unlock for `link_id` after `delay`.
    ///
    /// The task flips `processing` back to `pending` with a conditional
    /// update, so a link the webhook resolved in the meantime is untouched.
    /// Task failures are logged and never propagate.
    pub fn arm(&self, store: BoxedLinkStore, link_id: &str, delay: Duration) {
        let id = link_id.to_string();
        let task_id = id.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match store
                .transition_status(&task_id, LinkStatus::Processing, LinkStatus::Pending)
                .await
            {
                Ok(true) => info!(payment_id = %task_id, "Auto-unlock -> pending"),
                Ok(false) => {
                    debug!(payment_id = %task_id, "Auto-unlock skipped; link already resolved")
                }
                Err(e) => error!(payment_id = %task_id, "Auto-unlock failed: {}", e),
            }
        });

        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = tasks.insert(id, handle) {
            old.abort();
        }

        debug!(payment_id = %link_id, delay_ms = delay.as_millis() as u64, "Scheduled auto-unlock");
    }

    /// Cancel the unlock task for `link_id`, if one is scheduled
    pub fn cancel(&self, link_id: &str) {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = tasks.remove(link_id) {
            handle.abort();
            debug!(payment_id = %link_id, "Cancelled auto-unlock");
        }
    }
}

impl Default for UnlockScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Admin request to create a link
#[derive(Debug)]
pub struct NewLink {
    pub amount_minor: i64,
    pub currency: Currency,
    pub reference: String,
    pub country: String,
    pub expires_hours: i64,
}

/// A freshly created link and its shareable checkout URL
#[derive(Debug)]
pub struct CreatedLink {
    pub payment_id: String,
    pub checkout_url: String,
}

/// Result of a checkout visit on a usable link
#[derive(Debug)]
pub enum CheckoutOutcome {
    /// A payment session was opened; render the hosted checkout page
    Session(ProviderSession),
    /// An attempt is already in flight; show the waiting page
    InProgress,
}

/// Drives the link state machine
pub struct LifecycleController {
    store: BoxedLinkStore,
    provider: BoxedPaymentProvider,
    scheduler: UnlockScheduler,
    base_url: String,
    lock_duration: Duration,
}

impl LifecycleController {
    pub fn new(
        store: BoxedLinkStore,
        provider: BoxedPaymentProvider,
        base_url: String,
        lock_duration: Duration,
    ) -> Self {
        Self {
            store,
            provider,
            scheduler: UnlockScheduler::new(),
            base_url,
            lock_duration,
        }
    }

    /// Create a single-use link and return its checkout URL
    #[instrument(skip(self, request), fields(reference = %request.reference))]
    pub async fn create_link(&self, request: NewLink) -> LinkResult<CreatedLink> {
        let link = PaymentLink::new(
            request.amount_minor,
            request.currency,
            request.reference,
            request.country,
            request.expires_hours,
        )?;

        self.store.create(&link).await?;

        let checkout_url = format!("{}/checkout?paymentId={}", self.base_url, link.id);
        info!(payment_id = %link.id, amount = link.amount_minor, currency = %link.currency, "Created payment link");

        Ok(CreatedLink {
            payment_id: link.id,
            checkout_url,
        })
    }

    /// Shopper visits the checkout page.
    ///
    /// On a pending, unexpired link this opens a payment session and only
    /// then takes the processing lock, so a failed session creation leaves
    /// the link untouched.
    #[instrument(skip(self))]
    pub async fn begin_checkout(&self, payment_id: &str) -> LinkResult<CheckoutOutcome> {
        let link = self.load(payment_id).await?;

        if link.is_expired(chrono::Utc::now()) {
            return Err(LinkError::LinkExpired {
                payment_id: payment_id.to_string(),
            });
        }

        match link.status {
            LinkStatus::Paid => Err(LinkError::AlreadyPaid {
                payment_id: payment_id.to_string(),
            }),
            LinkStatus::Processing => Ok(CheckoutOutcome::InProgress),
            LinkStatus::Pending => {
                let attempt_reference = link.mint_attempt_reference();
                let return_url = format!("{}/result?paymentId={}", self.base_url, link.id);

                let session = self
                    .provider
                    .create_session(&link, &attempt_reference, &return_url)
                    .await?;

                // Lock only after the session exists
                if self
                    .store
                    .transition_status(&link.id, LinkStatus::Pending, LinkStatus::Processing)
                    .await?
                {
                    self.scheduler
                        .arm(self.store.clone(), &link.id, self.lock_duration);
                    info!(payment_id, "Locked -> processing for {:?}", self.lock_duration);
                } else {
                    debug!(payment_id, "Lock skipped; status changed during session creation");
                }

                Ok(CheckoutOutcome::Session(session))
            }
        }
    }

    /// Shopper returned from the provider redirect
    #[instrument(skip(self))]
    pub async fn confirm_return(&self, payment_id: &str) -> LinkResult<LinkStatus> {
        self.lock_if_pending(payment_id).await
    }

    /// Frontend reports an in-component completion (no redirect happened)
    #[instrument(skip(self))]
    pub async fn mark_processing(&self, payment_id: &str) -> LinkResult<LinkStatus> {
        self.lock_if_pending(payment_id).await
    }

    /// Current state of a link, for client polling
    pub async fn status(&self, payment_id: &str) -> LinkResult<PaymentLink> {
        self.load(payment_id).await
    }

    /// Provider webhook: verify, parse, and settle each payment outcome.
    ///
    /// Authorised outcomes mark the link paid; declined outcomes release the
    /// lock back to pending. Both cancel the link's pending unlock task.
    #[instrument(skip_all)]
    pub async fn handle_webhook(&self, payload: &[u8], signature: Option<&str>) -> LinkResult<()> {
        self.provider.verify_webhook(payload, signature)?;

        for outcome in self.provider.parse_webhook(payload)? {
            let reference = business_reference(&outcome.merchant_reference).to_string();

            let settled = self
                .store
                .settle_by_reference(&reference, outcome.authorised)
                .await?;

            if !settled {
                warn!(%reference, authorised = outcome.authorised, "Webhook did not match any settleable link");
                continue;
            }

            if outcome.authorised {
                info!(%reference, "AUTHORISATION success -> paid");
            } else {
                info!(%reference, "AUTHORISATION failed -> pending");
            }

            if let Some(link) = self.store.get_by_reference(&reference).await? {
                self.scheduler.cancel(&link.id);
            }
        }

        Ok(())
    }

    async fn load(&self, payment_id: &str) -> LinkResult<PaymentLink> {
        self.store
            .get_by_id(payment_id)
            .await?
            .ok_or_else(|| LinkError::LinkNotFound {
                payment_id: payment_id.to_string(),
            })
    }

    async fn lock_if_pending(&self, payment_id: &str) -> LinkResult<LinkStatus> {
        let link = self.load(payment_id).await?;

        if link.status == LinkStatus::Pending
            && self
                .store
                .transition_status(&link.id, LinkStatus::Pending, LinkStatus::Processing)
                .await?
        {
            self.scheduler
                .arm(self.store.clone(), &link.id, self.lock_duration);
            info!(payment_id, "Locked -> processing for {:?}", self.lock_duration);
            return Ok(LinkStatus::Processing);
        }

        // Lost the race or nothing to do; report what the store holds now
        Ok(self.load(payment_id).await?.status)
    }
}
