//! Request/response DTOs for the proxy API, and the error-to-HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::ProxyError;
use crate::domain::paypal::ApprovalLink;

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct TestConnectionQuery {
    pub api_key: String,
    /// Base64-encoded site URL.
    pub site_url: String,
    pub timestamp: Option<i64>,
    pub hash: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterOrderQuery {
    pub api_key: String,
    /// Base64-encoded JSON order data.
    pub order_data: String,
    pub timestamp: Option<i64>,
    pub hash: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderBody {
    pub api_key: String,
    pub order_id: String,
    /// Accepted as either a JSON string or number; kept as text because the
    /// tenant's signature covers the transmitted form.
    #[serde(deserialize_with = "amount_as_string")]
    pub amount: String,
    pub currency: String,
    pub return_url: Option<String>,
    pub cancel_url: Option<String>,
    pub timestamp: Option<i64>,
    pub hash: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CapturePaymentBody {
    pub api_key: String,
    pub paypal_order_id: String,
    pub timestamp: Option<i64>,
    pub hash: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentQuery {
    pub api_key: String,
    pub paypal_order_id: String,
    pub order_id: String,
    pub timestamp: Option<i64>,
    pub hash: Option<String>,
}

fn amount_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        _ => Err(D::Error::custom("amount must be a string or a number")),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct TestConnectionResponse {
    pub success: bool,
    pub message: String,
    pub site_name: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterOrderResponse {
    pub success: bool,
    pub message: String,
    pub order_id: String,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub success: bool,
    /// The PayPal order id.
    pub order_id: String,
    pub status: String,
    pub links: Vec<ApprovalLink>,
}

#[derive(Debug, Serialize)]
pub struct CapturePaymentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer_email: Option<String>,
    pub payment_method: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub success: bool,
}

/// Machine-readable error payload returned to tenants.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: code.into(),
            message: message.into(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ProxyError::Validation(_) => StatusCode::BAD_REQUEST,
            ProxyError::Gateway { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::NotFound(_) => StatusCode::NOT_FOUND,
            // Terminal-state no-op: reported as success, not failure.
            ProxyError::Conflict { .. } => {
                let body = serde_json::json!({
                    "success": true,
                    "code": self.code().to_string(),
                    "message": self.public_message(),
                });
                return (StatusCode::OK, Json(body)).into_response();
            }
            ProxyError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if matches!(self, ProxyError::Storage(_)) {
            tracing::error!(error = %self, "request failed on storage");
        }

        let body = ErrorResponse::new(self.code().to_string(), self.public_message());
        (status, Json(body)).into_response()
    }
}
