//! reqwest implementation of the PayPal gateway port.
//!
//! # Token lifecycle
//!
//! The OAuth bearer token is cached process-wide with an expiry instant
//! derived from the token response (minus a safety margin). A 401 from any
//! API call invalidates the cache and the request is retried exactly once
//! with a fresh token. No other retries happen here.
//!
//! # Errors
//!
//! Non-success statuses and transport failures both surface as
//! `GatewayError`; the message is mined from PayPal's structured error body
//! (`message`, else `error_description`, else the first detail description).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::domain::paypal::{ApprovalLink, CaptureDetails, OrderDetails, PaypalOrder};
use crate::ports::{CreateOrderRequest, GatewayError, PaymentGateway, WebhookVerification};

/// Bounded timeout for every outbound PayPal call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tokens are refreshed this long before their reported expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Fallback lifetime when the token response omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Which PayPal environment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaypalEnvironment {
    Sandbox,
    Live,
}

impl PaypalEnvironment {
    pub fn base_url(&self) -> &'static str {
        match self {
            PaypalEnvironment::Sandbox => "https://api-m.sandbox.paypal.com",
            PaypalEnvironment::Live => "https://api-m.paypal.com",
        }
    }
}

/// PayPal API credentials and environment selection.
#[derive(Clone)]
pub struct PaypalGatewayConfig {
    client_id: String,
    client_secret: SecretString,
    api_base_url: String,
    /// Configured webhook id; required for webhook signature verification.
    webhook_id: Option<String>,
}

impl PaypalGatewayConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        environment: PaypalEnvironment,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            api_base_url: environment.base_url().to_string(),
            webhook_id: None,
        }
    }

    pub fn with_webhook_id(mut self, webhook_id: impl Into<String>) -> Self {
        self.webhook_id = Some(webhook_id.into());
        self
    }

    /// Override the API base URL (tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

pub struct PaypalGateway {
    config: PaypalGatewayConfig,
    http_client: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl PaypalGateway {
    pub fn new(config: PaypalGatewayConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            token: Mutex::new(None),
        }
    }

    /// Return a bearer token, exchanging credentials when the cache is
    /// empty, stale, or being force-refreshed after a 401.
    async fn access_token(&self, force_refresh: bool) -> Result<String, GatewayError> {
        let mut cached = self.token.lock().await;

        if !force_refresh {
            if let Some(token) = cached.as_ref() {
                if token.is_fresh(Instant::now()) {
                    return Ok(token.value.clone());
                }
            }
        }

        let url = format!("{}/v1/oauth2/token", self.config.api_base_url);
        let response = self
            .http_client
            .post(&url)
            .basic_auth(
                &self.config.client_id,
                Some(self.config.client_secret.expose_secret()),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = provider_error_message(&body);
            tracing::error!(status, message = %message, "PayPal token exchange failed");
            return Err(GatewayError::authentication(message));
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: Option<u64>,
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::invalid_response(e.to_string()))?;

        if token.access_token.is_empty() {
            return Err(GatewayError::authentication(
                "token response carried no access token",
            ));
        }

        let lifetime = token
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);
        let expires_at = Instant::now() + lifetime.saturating_sub(TOKEN_EXPIRY_MARGIN);

        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at,
        });

        Ok(token.access_token)
    }

    /// Send a bearer-authorized request; on 401, refresh the token and retry
    /// exactly once.
    async fn send_authorized<F>(&self, build: F) -> Result<reqwest::Response, GatewayError>
    where
        F: Fn(&reqwest::Client, &str) -> reqwest::RequestBuilder,
    {
        let token = self.access_token(false).await?;
        let response = build(&self.http_client, &token)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if response.status() != reqwest::StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::info!("PayPal rejected the cached token; refreshing");
        let token = self.access_token(true).await?;
        build(&self.http_client, &token)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))
    }

    async fn api_error(response: reqwest::Response) -> GatewayError {
        let status = response.status().as_u16();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = provider_error_message(&body);
        tracing::error!(status, message = %message, "PayPal API error");
        GatewayError::api(message)
    }
}

/// Request body for order creation, per the v2 checkout API.
fn order_payload(request: &CreateOrderRequest) -> Value {
    let mut purchase_unit = json!({
        "amount": {
            "currency_code": request.currency,
            "value": request.amount.to_decimal_string(),
        }
    });
    if let Some(reference_id) = &request.reference_id {
        purchase_unit["reference_id"] = json!(reference_id);
    }

    let mut payload = json!({
        "intent": "CAPTURE",
        "purchase_units": [purchase_unit],
    });
    if let (Some(return_url), Some(cancel_url)) = (&request.return_url, &request.cancel_url) {
        payload["application_context"] = json!({
            "return_url": return_url,
            "cancel_url": cancel_url,
        });
    }
    payload
}

/// Mine a human-readable message out of PayPal's error body.
fn provider_error_message(body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .or_else(|| body.get("error_description").and_then(Value::as_str))
        .or_else(|| body.pointer("/details/0/description").and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| "unknown PayPal error".to_string())
}

#[async_trait]
impl PaymentGateway for PaypalGateway {
    async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<PaypalOrder, GatewayError> {
        let url = format!("{}/v2/checkout/orders", self.config.api_base_url);
        let payload = order_payload(&request);

        let response = self
            .send_authorized(|client, token| {
                client.post(&url).bearer_auth(token).json(&payload)
            })
            .await?;

        if response.status() != reqwest::StatusCode::CREATED {
            return Err(Self::api_error(response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::invalid_response(e.to_string()))?;

        let id = body
            .get("id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                GatewayError::invalid_response("order creation response carried no order id")
            })?
            .to_string();
        let status = body
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("CREATED")
            .to_string();
        let links: Vec<ApprovalLink> = body
            .get("links")
            .and_then(|links| serde_json::from_value(links.clone()).ok())
            .unwrap_or_default();

        Ok(PaypalOrder { id, status, links })
    }

    async fn capture_order(&self, paypal_order_id: &str) -> Result<CaptureDetails, GatewayError> {
        let url = format!(
            "{}/v2/checkout/orders/{}/capture",
            self.config.api_base_url, paypal_order_id
        );

        let response = self
            .send_authorized(|client, token| {
                client
                    .post(&url)
                    .bearer_auth(token)
                    .header("Prefer", "return=representation")
                    .json(&json!({}))
            })
            .await?;

        if response.status() != reqwest::StatusCode::CREATED {
            return Err(Self::api_error(response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::invalid_response(e.to_string()))?;
        let status = body
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(CaptureDetails { status, raw: body })
    }

    async fn get_order(&self, paypal_order_id: &str) -> Result<OrderDetails, GatewayError> {
        let url = format!(
            "{}/v2/checkout/orders/{}",
            self.config.api_base_url, paypal_order_id
        );

        let response = self
            .send_authorized(|client, token| client.get(&url).bearer_auth(token))
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(Self::api_error(response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::invalid_response(e.to_string()))?;
        let status = body
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(OrderDetails { status, raw: body })
    }

    async fn verify_webhook_signature(
        &self,
        verification: WebhookVerification,
    ) -> Result<bool, GatewayError> {
        let webhook_id = self.config.webhook_id.as_ref().ok_or_else(|| {
            GatewayError::new("gateway_config", "webhook_id is not configured")
        })?;

        let url = format!(
            "{}/v1/notifications/verify-webhook-signature",
            self.config.api_base_url
        );
        let payload = json!({
            "auth_algo": verification.auth_algo,
            "cert_url": verification.cert_url,
            "transmission_id": verification.transmission_id,
            "transmission_sig": verification.transmission_sig,
            "transmission_time": verification.transmission_time,
            "webhook_id": webhook_id,
            "webhook_event": verification.event,
        });

        let response = self
            .send_authorized(|client, token| {
                client.post(&url).bearer_auth(token).json(&payload)
            })
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(Self::api_error(response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::invalid_response(e.to_string()))?;

        Ok(body.get("verification_status").and_then(Value::as_str) == Some("SUCCESS"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::Amount;
    use serde_json::json;

    fn request(amount: &str) -> CreateOrderRequest {
        CreateOrderRequest {
            amount: Amount::parse(amount).unwrap(),
            currency: "USD".to_string(),
            reference_id: Some("ORD-1".to_string()),
            return_url: None,
            cancel_url: None,
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Order payload construction
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn order_payload_formats_amount_with_two_decimals() {
        let payload = order_payload(&request("7.5"));
        assert_eq!(
            payload.pointer("/purchase_units/0/amount/value"),
            Some(&json!("7.50"))
        );
        assert_eq!(payload["intent"], json!("CAPTURE"));
    }

    #[test]
    fn order_payload_includes_reference_id_when_present() {
        let payload = order_payload(&request("19.99"));
        assert_eq!(
            payload.pointer("/purchase_units/0/reference_id"),
            Some(&json!("ORD-1"))
        );

        let mut anonymous = request("19.99");
        anonymous.reference_id = None;
        let payload = order_payload(&anonymous);
        assert_eq!(payload.pointer("/purchase_units/0/reference_id"), None);
    }

    #[test]
    fn application_context_requires_both_urls() {
        let mut with_one = request("19.99");
        with_one.return_url = Some("https://shop.example.com/return".to_string());
        assert_eq!(order_payload(&with_one).get("application_context"), None);

        with_one.cancel_url = Some("https://shop.example.com/cancel".to_string());
        let payload = order_payload(&with_one);
        assert_eq!(
            payload.pointer("/application_context/return_url"),
            Some(&json!("https://shop.example.com/return"))
        );
    }

    // ══════════════════════════════════════════════════════════════
    // Error body mining
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn error_message_prefers_message_field() {
        let body = json!({
            "message": "top-level message",
            "error_description": "oauth description",
            "details": [{"description": "detail description"}]
        });
        assert_eq!(provider_error_message(&body), "top-level message");
    }

    #[test]
    fn error_message_falls_back_to_error_description() {
        let body = json!({
            "error": "invalid_client",
            "error_description": "Client Authentication failed"
        });
        assert_eq!(provider_error_message(&body), "Client Authentication failed");
    }

    #[test]
    fn error_message_falls_back_to_first_detail() {
        let body = json!({
            "name": "UNPROCESSABLE_ENTITY",
            "details": [
                {"description": "The instrument presented was declined."},
                {"description": "second detail"}
            ]
        });
        assert_eq!(
            provider_error_message(&body),
            "The instrument presented was declined."
        );
    }

    #[test]
    fn error_message_has_a_generic_fallback() {
        assert_eq!(provider_error_message(&json!({})), "unknown PayPal error");
        assert_eq!(provider_error_message(&Value::Null), "unknown PayPal error");
    }

    // ══════════════════════════════════════════════════════════════
    // Configuration and token cache
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn environment_selects_base_url() {
        assert_eq!(
            PaypalEnvironment::Sandbox.base_url(),
            "https://api-m.sandbox.paypal.com"
        );
        assert_eq!(PaypalEnvironment::Live.base_url(), "https://api-m.paypal.com");
    }

    #[test]
    fn config_builder_sets_webhook_id_and_base_url() {
        let config = PaypalGatewayConfig::new("id", "secret", PaypalEnvironment::Sandbox)
            .with_webhook_id("WH-42")
            .with_base_url("http://localhost:9000");
        assert_eq!(config.webhook_id.as_deref(), Some("WH-42"));
        assert_eq!(config.api_base_url, "http://localhost:9000");
    }

    #[test]
    fn cached_token_freshness_is_strict() {
        let now = Instant::now();
        let fresh = CachedToken {
            value: "t".to_string(),
            expires_at: now + Duration::from_secs(1),
        };
        let stale = CachedToken {
            value: "t".to_string(),
            expires_at: now,
        };
        assert!(fresh.is_fresh(now));
        assert!(!stale.is_fresh(now));
    }

    #[tokio::test]
    async fn webhook_verification_without_configured_id_fails() {
        let gateway = PaypalGateway::new(PaypalGatewayConfig::new(
            "id",
            "secret",
            PaypalEnvironment::Sandbox,
        ));
        let result = gateway
            .verify_webhook_signature(WebhookVerification {
                transmission_id: "t".to_string(),
                transmission_time: "t".to_string(),
                transmission_sig: "s".to_string(),
                cert_url: "c".to_string(),
                auth_algo: "a".to_string(),
                event: json!({}),
            })
            .await;
        assert!(matches!(result, Err(e) if e.code == "gateway_config"));
    }
}
