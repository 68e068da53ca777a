//! PayPal gateway port.
//!
//! Encapsulates every PayPal HTTP interaction and normalizes failures into
//! one `GatewayError` family so callers need a single error path whether the
//! provider rejected the request or the network dropped it.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::foundation::ProxyError;
use crate::domain::paypal::{CaptureDetails, OrderDetails, PaypalOrder};
use crate::domain::transaction::Amount;

/// A normalized gateway failure. The message carries PayPal's own error
/// text whenever one could be extracted from the response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    pub code: String,
    pub message: String,
}

impl GatewayError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Transport-level failure (timeout, DNS, connection reset).
    pub fn network(message: impl Into<String>) -> Self {
        Self::new("gateway_network", message)
    }

    /// Could not obtain or use OAuth credentials.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new("gateway_auth", message)
    }

    /// The provider returned a non-success status.
    pub fn api(message: impl Into<String>) -> Self {
        Self::new("gateway_api", message)
    }

    /// The provider returned a success status with an unusable body.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new("gateway_response", message)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for ProxyError {
    fn from(err: GatewayError) -> Self {
        ProxyError::Gateway {
            code: err.code,
            message: err.message,
        }
    }
}

/// Parameters for creating a checkout order.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub amount: Amount,
    pub currency: String,
    /// The tenant's order id, attached as the purchase unit reference.
    pub reference_id: Option<String>,
    pub return_url: Option<String>,
    pub cancel_url: Option<String>,
}

/// The transmission headers PayPal attaches to webhook deliveries, plus the
/// event body, as required by the verify-webhook-signature API.
#[derive(Debug, Clone)]
pub struct WebhookVerification {
    pub transmission_id: String,
    pub transmission_time: String,
    pub transmission_sig: String,
    pub cert_url: String,
    pub auth_algo: String,
    pub event: Value,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// POST a checkout-order-create request. Succeeds only on HTTP 201 with
    /// a non-empty order id in the response.
    async fn create_order(&self, request: CreateOrderRequest)
        -> Result<PaypalOrder, GatewayError>;

    /// POST a capture request for an approved order. Succeeds only on 201.
    async fn capture_order(&self, paypal_order_id: &str)
        -> Result<CaptureDetails, GatewayError>;

    /// GET order details. Succeeds only on 200.
    async fn get_order(&self, paypal_order_id: &str) -> Result<OrderDetails, GatewayError>;

    /// Ask PayPal whether an inbound webhook delivery is authentic.
    async fn verify_webhook_signature(
        &self,
        verification: WebhookVerification,
    ) -> Result<bool, GatewayError>;
}
