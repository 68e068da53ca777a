//! Axum router configuration for the proxy API.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{
    capture_payment, create_paypal_order, paypal_webhook, register_order, test_connection,
    verify_payment, ProxyAppState,
};

/// Tenant-facing routes, all requiring an api_key and (per policy) a
/// signature.
///
/// - `GET /test-connection` - credential check
/// - `GET /register-order` - stage order data ahead of checkout
/// - `POST /create-paypal-order` - create the PayPal order
/// - `POST /capture-payment` - capture an approved order
/// - `GET /verify-payment` - cross-check a payment against PayPal
pub fn proxy_routes() -> Router<ProxyAppState> {
    Router::new()
        .route("/test-connection", get(test_connection))
        .route("/register-order", get(register_order))
        .route("/create-paypal-order", post(create_paypal_order))
        .route("/capture-payment", post(capture_payment))
        .route("/verify-payment", get(verify_payment))
}

/// Provider-originated routes. No tenant authentication; deliveries are
/// verified against PayPal when a webhook id is configured.
///
/// - `POST /paypal-webhook` - PayPal event ingestion
pub fn webhook_routes() -> Router<ProxyAppState> {
    Router::new().route("/paypal-webhook", post(paypal_webhook))
}

/// The complete proxy router, suitable for nesting under `/proxy/v1`.
pub fn proxy_router() -> Router<ProxyAppState> {
    proxy_routes().merge(webhook_routes())
}
