//! # Routes
//!
//! Axum router configuration for the payment-links service.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Admin:
///   - GET  /admin - Link creation form
///   - POST /admin - Create a payment link
///
/// - Shopper:
///   - GET /checkout?paymentId= - Hosted checkout page
///   - GET /result?paymentId= - Return landing page (locks the link)
///   - GET /status?paymentId= - Status JSON for polling
///   - POST /mark-processing - In-component completion event
///
/// - Provider:
///   - POST /webhook - Payment outcome notifications
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .route(
            "/admin",
            get(handlers::admin_form).post(handlers::create_link),
        )
        .route("/checkout", get(handlers::checkout_page))
        .route("/result", get(handlers::result_page))
        .route("/status", get(handlers::link_status))
        .route("/mark-processing", post(handlers::mark_processing))
        .route("/webhook", post(handlers::webhook))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AppConfig, AppState};
    use axum::body::Bytes;
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use link_adyen::{webhook::sign_payload, AdyenConfig, AdyenSessionProvider};
    use link_core::{BoxedLinkStore, BoxedPaymentProvider};
    use link_store::SqliteLinkStore;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn test_config() -> AppConfig {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            base_url: "http://localhost:8080".to_string(),
            environment: "test".to_string(),
            processing_lock_secs: 30,
            database_path: ":memory:".to_string(),
        }
    }

    /// Router over an in-memory store and an Adyen provider that never hits
    /// the network (none of these routes create sessions).
    fn server_with_hmac(hmac_key: Option<&str>) -> TestServer {
        let store: BoxedLinkStore = Arc::new(SqliteLinkStore::open_in_memory().unwrap());
        let mut config = AdyenConfig::new("test-api-key", "TestMerchant", "test_client_key");
        if let Some(key) = hmac_key {
            config = config.with_hmac_key(key);
        }
        let provider: BoxedPaymentProvider = Arc::new(AdyenSessionProvider::new(config));
        let state = AppState::with_parts(store, provider, test_config());

        TestServer::new(create_router(state)).unwrap()
    }

    fn server() -> TestServer {
        server_with_hmac(None)
    }

    fn create_link_form(reference: &str) -> Vec<(&'static str, String)> {
        vec![
            ("price", "10.99".to_string()),
            ("currency", "EUR".to_string()),
            ("reference", reference.to_string()),
            ("country", "NL".to_string()),
        ]
    }

    fn notification(reference: &str, success: bool) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "live": "false",
            "notificationItems": [{
                "NotificationRequestItem": {
                    "eventCode": "AUTHORISATION",
                    "success": if success { "true" } else { "false" },
                    "merchantReference": reference,
                    "pspReference": "882d7abf"
                }
            }]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let server = server();
        let res = server.get("/health").await;
        res.assert_status_ok();

        let body: Value = res.json();
        assert_eq!(body["service"], "payment-links");
    }

    #[tokio::test]
    async fn test_admin_create_and_duplicate() {
        let server = server();

        let res = server.post("/admin").form(&create_link_form("ORDER42")).await;
        res.assert_status_ok();
        let body: Value = res.json();
        assert_eq!(body["message"], "Payment link generated");
        assert!(body["url"]
            .as_str()
            .unwrap()
            .starts_with("http://localhost:8080/checkout?paymentId="));

        // Duplicate reference rejected
        let res = server.post("/admin").form(&create_link_form("ORDER42")).await;
        res.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_status_unknown_and_known() {
        let server = server();

        let res = server.get("/status?paymentId=nope").await;
        res.assert_status(StatusCode::NOT_FOUND);

        let res = server.post("/admin").form(&create_link_form("ORDER1")).await;
        let body: Value = res.json();
        let url = body["url"].as_str().unwrap();
        let payment_id = url.rsplit('=').next().unwrap();

        let res = server.get(&format!("/status?paymentId={}", payment_id)).await;
        res.assert_status_ok();
        let status: Value = res.json();
        assert_eq!(status["paymentId"], payment_id);
        assert_eq!(status["reference"], "ORDER1");
        assert_eq!(status["status"], "pending");
    }

    #[tokio::test]
    async fn test_webhook_settles_link() {
        let server = server();

        let res = server.post("/admin").form(&create_link_form("R")).await;
        let body: Value = res.json();
        let payment_id = body["url"].as_str().unwrap().rsplit('=').next().unwrap().to_string();

        // HMAC validation is skipped for this provider config
        let res = server
            .post("/webhook")
            .bytes(Bytes::from(notification("R_ab12cd34", true)))
            .await;
        res.assert_status_ok();
        res.assert_text("[accepted]");

        let res = server.get(&format!("/status?paymentId={}", payment_id)).await;
        let status: Value = res.json();
        assert_eq!(status["status"], "paid");
    }

    #[tokio::test]
    async fn test_webhook_rejects_bad_signature() {
        let key = "c2VjcmV0";
        let server = server_with_hmac(Some(key));
        let payload = notification("R_ab12cd34", true);

        // Missing signature
        let res = server.post("/webhook").bytes(Bytes::from(payload.clone())).await;
        res.assert_status(StatusCode::UNAUTHORIZED);

        // Valid signature accepted
        let signature = sign_payload(key, &payload);
        let res = server
            .post("/webhook")
            .add_header(
                HeaderName::from_static("hmac-signature"),
                HeaderValue::from_str(&signature).unwrap(),
            )
            .bytes(Bytes::from(payload))
            .await;
        res.assert_status_ok();
    }

    #[tokio::test]
    async fn test_result_page_locks_link() {
        let server = server();

        let res = server.post("/admin").form(&create_link_form("R")).await;
        let body: Value = res.json();
        let payment_id = body["url"].as_str().unwrap().rsplit('=').next().unwrap().to_string();

        let res = server.get(&format!("/result?paymentId={}", payment_id)).await;
        res.assert_status_ok();

        let res = server.get(&format!("/status?paymentId={}", payment_id)).await;
        let status: Value = res.json();
        assert_eq!(status["status"], "processing");
    }

    #[tokio::test]
    async fn test_mark_processing_unknown_link() {
        let server = server();
        let res = server
            .post("/mark-processing")
            .json(&json!({ "paymentId": "nope" }))
            .await;
        res.assert_status(StatusCode::NOT_FOUND);
    }
}
