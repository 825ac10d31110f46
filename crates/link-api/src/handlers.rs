//! # Request Handlers
//!
//! Axum request handlers for the payment-links service.
//! Admin and status routes speak JSON; the shopper-facing routes render
//! small self-contained HTML pages.

use crate::lifecycle::{CheckoutOutcome, NewLink};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Form, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use link_core::{Currency, LinkError, LinkStatus, ProviderSession};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Admin form for creating a payment link
#[derive(Debug, Deserialize)]
pub struct CreateLinkForm {
    /// Price in major units (converted to minor units per currency)
    pub price: f64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Merchant business reference (globally unique)
    pub reference: String,
    /// ISO 3166-1 alpha-2 country code
    pub country: String,
    /// Link TTL in hours
    #[serde(default = "default_expires_hours")]
    pub expires_hours: i64,
}

fn default_expires_hours() -> i64 {
    24
}

/// Create link response
#[derive(Debug, Serialize)]
pub struct CreateLinkResponse {
    pub message: String,
    /// Shareable checkout URL containing the link id
    pub url: String,
}

/// Status polling response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(rename = "paymentId")]
    pub payment_id: String,
    pub reference: String,
    pub status: LinkStatus,
}

/// Client completion event body
#[derive(Debug, Deserialize)]
pub struct MarkProcessingRequest {
    #[serde(rename = "paymentId")]
    pub payment_id: String,
}

/// Client completion event response
#[derive(Debug, Serialize)]
pub struct MarkProcessingResponse {
    pub status: LinkStatus,
}

/// Query carrying the link id
#[derive(Debug, Deserialize)]
pub struct PaymentIdQuery {
    #[serde(rename = "paymentId")]
    pub payment_id: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

fn link_error_to_response(err: LinkError) -> (StatusCode, Json<ErrorResponse>) {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code);
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

fn link_error_to_page(err: LinkError) -> (StatusCode, Html<String>) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Html(render_message_page(&err.to_string())))
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "payment-links",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Admin form page
pub async fn admin_form() -> impl IntoResponse {
    Html(ADMIN_FORM_PAGE)
}

/// Create a payment link from the admin form
#[instrument(skip(state, form), fields(reference = %form.reference))]
pub async fn create_link(
    State(state): State<AppState>,
    Form(form): Form<CreateLinkForm>,
) -> Result<Json<CreateLinkResponse>, (StatusCode, Json<ErrorResponse>)> {
    let currency: Currency = form.currency.parse().map_err(link_error_to_response)?;
    let amount_minor = currency.to_minor_units(form.price);

    let created = state
        .controller
        .create_link(NewLink {
            amount_minor,
            currency,
            reference: form.reference,
            country: form.country,
            expires_hours: form.expires_hours,
        })
        .await
        .map_err(|e| {
            error!("Failed to create link: {}", e);
            link_error_to_response(e)
        })?;

    Ok(Json(CreateLinkResponse {
        message: "Payment link generated".to_string(),
        url: created.checkout_url,
    }))
}

/// Shopper checkout page: opens a payment session on a usable link,
/// otherwise renders the blocking/terminal message
#[instrument(skip(state), fields(payment_id = %query.payment_id))]
pub async fn checkout_page(
    State(state): State<AppState>,
    Query(query): Query<PaymentIdQuery>,
) -> Response {
    match state.controller.begin_checkout(&query.payment_id).await {
        Ok(CheckoutOutcome::Session(session)) => {
            Html(render_checkout_page(&query.payment_id, &session)).into_response()
        }
        Ok(CheckoutOutcome::InProgress) => Html(render_message_page(
            "Payment in progress. This page will update once it's completed.",
        ))
        .into_response(),
        Err(e) => link_error_to_page(e).into_response(),
    }
}

/// Shopper-return landing page: locks a pending link
#[instrument(skip(state), fields(payment_id = %query.payment_id))]
pub async fn result_page(
    State(state): State<AppState>,
    Query(query): Query<PaymentIdQuery>,
) -> Response {
    match state.controller.confirm_return(&query.payment_id).await {
        Ok(_) => Html(render_message_page(
            "Thanks! We're confirming your payment. This page will update once it's completed.",
        ))
        .into_response(),
        Err(e) => link_error_to_page(e).into_response(),
    }
}

/// JSON status endpoint for client polling
pub async fn link_status(
    State(state): State<AppState>,
    Query(query): Query<PaymentIdQuery>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    let link = state
        .controller
        .status(&query.payment_id)
        .await
        .map_err(link_error_to_response)?;

    Ok(Json(StatusResponse {
        payment_id: link.id,
        reference: link.reference,
        status: link.status,
    }))
}

/// Frontend completion event for in-component payments (no redirect)
#[instrument(skip(state, request), fields(payment_id = %request.payment_id))]
pub async fn mark_processing(
    State(state): State<AppState>,
    Json(request): Json<MarkProcessingRequest>,
) -> Result<Json<MarkProcessingResponse>, (StatusCode, Json<ErrorResponse>)> {
    let status = state
        .controller
        .mark_processing(&request.payment_id)
        .await
        .map_err(link_error_to_response)?;

    Ok(Json(MarkProcessingResponse { status }))
}

/// Provider webhook: verifies the signature over the raw body and settles
/// the notified payment outcomes
#[instrument(skip(state, headers, body))]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, (StatusCode, Json<ErrorResponse>)> {
    // HeaderMap lookups are case-insensitive, covering every header casing
    // providers have been seen to send
    let signature = headers
        .get(link_adyen::SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    state
        .controller
        .handle_webhook(&body, signature)
        .await
        .map_err(|e| {
            error!("Webhook rejected: {}", e);
            link_error_to_response(e)
        })?;

    // 2xx within the provider timeout, or the notification is retried
    Ok("[accepted]")
}

// =============================================================================
// HTML Pages
// =============================================================================

const ADMIN_FORM_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Create Payment Link</title></head>
<body style="font-family: system-ui; max-width: 480px; margin: 40px auto;">
    <h1>Create Payment Link</h1>
    <form method="post" action="/admin">
        <label>Price <input name="price" type="number" step="0.01" required></label><br><br>
        <label>Currency <input name="currency" value="EUR" required></label><br><br>
        <label>Reference <input name="reference" required></label><br><br>
        <label>Country <input name="country" value="NL" required></label><br><br>
        <label>Expires (hours) <input name="expires_hours" type="number" value="24"></label><br><br>
        <button type="submit">Generate link</button>
    </form>
</body>
</html>
"#;

fn render_message_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Payment</title></head>
<body style="font-family: system-ui; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0; background: linear-gradient(135deg, #1a1a2e 0%, #16213e 100%);">
    <div style="background: white; padding: 60px; border-radius: 16px; text-align: center; max-width: 420px;">
        <p>{}</p>
    </div>
</body>
</html>
"#,
        message
    )
}

fn render_checkout_page(payment_id: &str, session: &ProviderSession) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Checkout</title>
    <script src="https://checkoutshopper-test.adyen.com/checkoutshopper/sdk/5.66.1/adyen.js"></script>
    <link rel="stylesheet" href="https://checkoutshopper-test.adyen.com/checkoutshopper/sdk/5.66.1/adyen.css"/>
</head>
<body style="font-family: system-ui; max-width: 520px; margin: 40px auto;">
    <h1>Complete your payment</h1>
    <div id="dropin-container"></div>
    <script>
        (async () => {{
            const checkout = await AdyenCheckout({{
                environment: 'test',
                clientKey: '{client_key}',
                session: {{ id: '{session_id}', sessionData: '{session_data}' }},
                onPaymentCompleted: async () => {{
                    await fetch('/mark-processing', {{
                        method: 'POST',
                        headers: {{ 'Content-Type': 'application/json' }},
                        body: JSON.stringify({{ paymentId: '{payment_id}' }}),
                    }});
                    window.location = '/result?paymentId={payment_id}';
                }},
                onError: (error) => console.error(error),
            }});
            checkout.create('dropin').mount('#dropin-container');
        }})();
    </script>
</body>
</html>
"#,
        client_key = session.client_key,
        session_id = session.session_id,
        session_data = session.session_data,
        payment_id = payment_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new("Test error", 400);
        assert_eq!(err.error, "Test error");
        assert_eq!(err.code, 400);
    }

    #[test]
    fn test_link_error_conversion() {
        let err = LinkError::LinkNotFound {
            payment_id: "x".to_string(),
        };
        let (status, _json) = link_error_to_response(err);
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_checkout_page_embeds_session() {
        let session = ProviderSession {
            session_id: "CS12345".to_string(),
            session_data: "Ab02b4c0".to_string(),
            reference: "R_ab12cd34".to_string(),
            client_key: "test_client".to_string(),
        };
        let page = render_checkout_page("pay-1", &session);

        assert!(page.contains("CS12345"));
        assert!(page.contains("Ab02b4c0"));
        assert!(page.contains("test_client"));
        assert!(page.contains("/result?paymentId=pay-1"));
    }

    #[test]
    fn test_message_page_embeds_text() {
        let page = render_message_page("This payment link has expired");
        assert!(page.contains("expired"));
    }
}
