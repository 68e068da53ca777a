//! Signed GET notification to the tenant's callback endpoint.
//!
//! The hash lets the tenant authenticate the notification the same way the
//! proxy authenticates tenant requests:
//! `hash = HMAC-SHA256(api_secret, timestamp || order_id || status || api_key)`.
//! Delivery is fire-and-forget with a bounded timeout; the ledger is already
//! authoritative, so failures are only logged.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::auth::compute_signature;
use crate::domain::site::TenantSite;
use crate::ports::{CallbackNotification, CallbackNotifier};

/// Fixed relative path of the tenant's callback endpoint.
pub const CALLBACK_PATH: &str = "payment-callback";

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpCallbackNotifier {
    client: reqwest::Client,
}

impl HttpCallbackNotifier {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(NOTIFY_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    fn callback_url(site: &TenantSite) -> String {
        format!("{}/{}", site.url.trim_end_matches('/'), CALLBACK_PATH)
    }

    fn query_params(
        site: &TenantSite,
        notification: &CallbackNotification,
        timestamp: i64,
    ) -> Vec<(&'static str, String)> {
        let status = notification.status.as_str();
        let payload = format!("{}{}", notification.order_id, status);
        let hash = compute_signature(site.secret_bytes(), timestamp, &payload, &site.api_key);

        let mut params = vec![
            ("order_id", notification.order_id.clone()),
            ("status", status.to_string()),
            ("paypal_order_id", notification.paypal_order_id.clone()),
        ];
        if let Some(transaction_id) = &notification.transaction_id {
            params.push(("transaction_id", transaction_id.clone()));
        }
        if let Some(reason) = &notification.reason {
            params.push(("reason", reason.clone()));
        }
        params.push(("timestamp", timestamp.to_string()));
        params.push(("hash", hash));
        params
    }
}

impl Default for HttpCallbackNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CallbackNotifier for HttpCallbackNotifier {
    async fn notify(&self, site: &TenantSite, notification: &CallbackNotification) {
        let url = Self::callback_url(site);
        let params = Self::query_params(site, notification, Utc::now().timestamp());

        match self.client.get(&url).query(&params).send().await {
            Ok(response) => {
                tracing::info!(
                    site_id = %site.id,
                    order_id = %notification.order_id,
                    status = notification.status.as_str(),
                    response_status = response.status().as_u16(),
                    "tenant notified of payment outcome"
                );
            }
            Err(e) => {
                tracing::error!(
                    site_id = %site.id,
                    order_id = %notification.order_id,
                    error = %e,
                    "failed to notify tenant of payment outcome"
                );
            }
        }
    }
}
