//! HTTP handlers for the proxy endpoints.
//!
//! Each handler turns the wire request into a command, runs the matching
//! application handler, and maps the result (or `ProxyError`) onto the
//! response DTOs. The webhook endpoint has its own acknowledgement rules:
//! processing failures are logged and ACKed with 200 so the provider does
//! not retry-storm us; only unauthentic deliveries and unparseable bodies
//! are rejected.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::application::handlers::checkout::{
    CapturePaymentCommand, CapturePaymentHandler, CreateOrderCommand, CreateOrderHandler,
    RegisterOrderCommand, RegisterOrderHandler, TestConnectionCommand, TestConnectionHandler,
    VerifyPaymentCommand, VerifyPaymentHandler,
};
use crate::application::handlers::webhook::{
    ProcessWebhookCommand, ProcessWebhookHandler, WebhookTransmission,
};
use crate::application::RequestAuthenticator;
use crate::domain::auth::SignedEnvelope;
use crate::domain::foundation::ProxyError;
use crate::ports::{
    CallbackNotifier, OrderContextStore, PaymentGateway, SiteRepository, TransactionLedger,
};

use super::dto::{
    CapturePaymentBody, CapturePaymentResponse, CreateOrderBody, CreateOrderResponse,
    ErrorResponse, RegisterOrderQuery, RegisterOrderResponse, TestConnectionQuery,
    TestConnectionResponse, VerifyPaymentQuery, VerifyPaymentResponse, WebhookAck,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state: Arc-wrapped ports, cloned per request.
#[derive(Clone)]
pub struct ProxyAppState {
    pub sites: Arc<dyn SiteRepository>,
    pub ledger: Arc<dyn TransactionLedger>,
    pub contexts: Arc<dyn OrderContextStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn CallbackNotifier>,
    /// Enabled when a PayPal webhook id is configured.
    pub verify_webhook_signatures: bool,
}

impl ProxyAppState {
    fn authenticator(&self) -> Arc<RequestAuthenticator> {
        Arc::new(RequestAuthenticator::new(self.sites.clone()))
    }

    pub fn test_connection_handler(&self) -> TestConnectionHandler {
        TestConnectionHandler::new(self.authenticator())
    }

    pub fn register_order_handler(&self) -> RegisterOrderHandler {
        RegisterOrderHandler::new(self.authenticator(), self.contexts.clone())
    }

    pub fn create_order_handler(&self) -> CreateOrderHandler {
        CreateOrderHandler::new(self.authenticator(), self.gateway.clone(), self.ledger.clone())
    }

    pub fn capture_payment_handler(&self) -> CapturePaymentHandler {
        CapturePaymentHandler::new(self.authenticator(), self.gateway.clone(), self.ledger.clone())
    }

    pub fn verify_payment_handler(&self) -> VerifyPaymentHandler {
        VerifyPaymentHandler::new(self.authenticator(), self.gateway.clone(), self.ledger.clone())
    }

    pub fn webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(
            self.gateway.clone(),
            self.ledger.clone(),
            self.sites.clone(),
            self.notifier.clone(),
            self.verify_webhook_signatures,
        )
    }
}

fn envelope(timestamp: Option<i64>, hash: Option<String>) -> Option<SignedEnvelope> {
    match (timestamp, hash) {
        (Some(timestamp), Some(hash)) => Some(SignedEnvelope { timestamp, hash }),
        _ => None,
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Tenant-facing handlers
// ════════════════════════════════════════════════════════════════════════════════

pub async fn test_connection(
    State(state): State<ProxyAppState>,
    Query(query): Query<TestConnectionQuery>,
) -> Response {
    let command = TestConnectionCommand {
        api_key: query.api_key,
        site_url_b64: query.site_url,
        envelope: envelope(query.timestamp, query.hash),
    };

    match state.test_connection_handler().handle(command).await {
        Ok(result) => Json(TestConnectionResponse {
            success: true,
            message: "connection successful".to_string(),
            site_name: result.site_name,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn register_order(
    State(state): State<ProxyAppState>,
    Query(query): Query<RegisterOrderQuery>,
) -> Response {
    let command = RegisterOrderCommand {
        api_key: query.api_key,
        order_data_b64: query.order_data,
        envelope: envelope(query.timestamp, query.hash),
    };

    match state.register_order_handler().handle(command).await {
        Ok(result) => Json(RegisterOrderResponse {
            success: true,
            message: "order registered successfully".to_string(),
            order_id: result.order_id,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_paypal_order(
    State(state): State<ProxyAppState>,
    Json(body): Json<CreateOrderBody>,
) -> Response {
    let command = CreateOrderCommand {
        api_key: body.api_key,
        order_id: body.order_id,
        amount: body.amount,
        currency: body.currency,
        return_url: body.return_url,
        cancel_url: body.cancel_url,
        envelope: envelope(body.timestamp, body.hash),
    };

    match state.create_order_handler().handle(command).await {
        Ok(result) => Json(CreateOrderResponse {
            success: true,
            order_id: result.paypal_order_id,
            status: result.status,
            links: result.links,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn capture_payment(
    State(state): State<ProxyAppState>,
    Json(body): Json<CapturePaymentBody>,
) -> Response {
    let command = CapturePaymentCommand {
        api_key: body.api_key,
        paypal_order_id: body.paypal_order_id,
        envelope: envelope(body.timestamp, body.hash),
    };

    match state.capture_payment_handler().handle(command).await {
        Ok(result) => Json(CapturePaymentResponse {
            success: true,
            transaction_id: result.transaction_id,
            status: result.status,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn verify_payment(
    State(state): State<ProxyAppState>,
    Query(query): Query<VerifyPaymentQuery>,
) -> Response {
    let command = VerifyPaymentCommand {
        api_key: query.api_key,
        paypal_order_id: query.paypal_order_id,
        order_id: query.order_id,
        envelope: envelope(query.timestamp, query.hash),
    };

    match state.verify_payment_handler().handle(command).await {
        Ok(result) => Json(VerifyPaymentResponse {
            success: true,
            message: "payment verified successfully".to_string(),
            status: result.status.as_str().to_string(),
            transaction_id: result.transaction_id,
            payer_email: result.payer_email,
            payment_method: "paypal".to_string(),
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook handler
// ════════════════════════════════════════════════════════════════════════════════

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// PayPal's transmission headers, when all of them are present.
fn extract_transmission(headers: &HeaderMap) -> Option<WebhookTransmission> {
    Some(WebhookTransmission {
        transmission_id: header(headers, "paypal-transmission-id")?,
        transmission_time: header(headers, "paypal-transmission-time")?,
        transmission_sig: header(headers, "paypal-transmission-sig")?,
        cert_url: header(headers, "paypal-cert-url")?,
        auth_algo: header(headers, "paypal-auth-algo")?,
    })
}

pub async fn paypal_webhook(
    State(state): State<ProxyAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("VALIDATION_ERROR", "invalid webhook payload")),
            )
                .into_response();
        }
    };

    let command = ProcessWebhookCommand {
        payload,
        transmission: extract_transmission(&headers),
    };

    match state.webhook_handler().handle(command).await {
        Ok(_) => Json(WebhookAck { success: true }).into_response(),
        Err(ProxyError::Unauthenticated(message)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("UNAUTHENTICATED", message)),
        )
            .into_response(),
        Err(e) => {
            // At-least-once delivery: our failure must not trigger provider
            // retries, the ledger converges through the other signal.
            tracing::error!(error = %e, "webhook processing failed");
            Json(WebhookAck { success: true }).into_response()
        }
    }
}
