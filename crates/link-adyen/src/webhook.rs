//! # Adyen Webhook Handling
//!
//! Signature verification and payload parsing for Adyen standard webhooks.
//!
//! Adyen signs the raw request body with HMAC-SHA256; the key is configured
//! base64-encoded and the signature arrives base64-encoded in the
//! `Hmac-Signature` header. Notification batches carry one or more
//! `NotificationRequestItem`s; only `AUTHORISATION` events settle a link.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use link_core::{LinkError, LinkResult, PaymentOutcome};
use serde::Deserialize;
use tracing::debug;

/// Header carrying the webhook signature (matched case-insensitively)
pub const SIGNATURE_HEADER: &str = "hmac-signature";

/// Event code for payment outcome notifications
const EVENT_AUTHORISATION: &str = "AUTHORISATION";

/// Compute the base64 HMAC-SHA256 signature for a payload.
///
/// The key is treated as base64; a key that fails to decode is used as raw
/// bytes, matching Adyen's test-console behaviour with ad-hoc keys.
pub fn sign_payload(hmac_key: &str, payload: &[u8]) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let key_bytes = BASE64
        .decode(hmac_key)
        .unwrap_or_else(|_| hmac_key.as_bytes().to_vec());

    let mut mac =
        HmacSha256::new_from_slice(&key_bytes).expect("HMAC can take key of any size");
    mac.update(payload);
    BASE64.encode(mac.finalize().into_bytes())
}

/// Verify a webhook signature over the raw body
pub fn verify_signature(hmac_key: &str, payload: &[u8], signature: &str) -> LinkResult<()> {
    let computed = sign_payload(hmac_key, payload);

    if constant_time_compare(&computed, signature) {
        Ok(())
    } else {
        Err(LinkError::WebhookVerificationFailed(
            "Signature mismatch".to_string(),
        ))
    }
}

/// Parse a notification batch into payment outcomes.
///
/// Events other than `AUTHORISATION` are skipped; an empty batch is valid.
pub fn parse_notification(payload: &[u8]) -> LinkResult<Vec<PaymentOutcome>> {
    let notification: AdyenNotification = serde_json::from_slice(payload)
        .map_err(|e| LinkError::WebhookParseError(format!("Failed to parse webhook: {}", e)))?;

    let outcomes = notification
        .notification_items
        .into_iter()
        .filter_map(|wrapper| {
            let item = wrapper.notification_request_item;
            if item.event_code == EVENT_AUTHORISATION {
                let authorised = item.is_success();
                Some(PaymentOutcome {
                    merchant_reference: item.merchant_reference,
                    authorised,
                    psp_reference: item.psp_reference,
                })
            } else {
                debug!(event_code = %item.event_code, "ignoring webhook event");
                None
            }
        })
        .collect();

    Ok(outcomes)
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

// =============================================================================
// Adyen Webhook Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct AdyenNotification {
    #[serde(rename = "notificationItems", default)]
    notification_items: Vec<NotificationItemWrapper>,
}

#[derive(Debug, Deserialize)]
struct NotificationItemWrapper {
    #[serde(rename = "NotificationRequestItem")]
    notification_request_item: NotificationRequestItem,
}

#[derive(Debug, Deserialize)]
struct NotificationRequestItem {
    #[serde(rename = "eventCode")]
    event_code: String,

    /// Adyen sends success as the string "true"/"false"
    #[serde(default)]
    success: String,

    #[serde(rename = "merchantReference", default)]
    merchant_reference: String,

    #[serde(rename = "pspReference", default)]
    psp_reference: Option<String>,
}

impl NotificationRequestItem {
    fn is_success(&self) -> bool {
        self.success.eq_ignore_ascii_case("true")
    }
}
