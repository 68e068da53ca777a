//! RegisterOrderHandler - stages a tenant's order data ahead of checkout.
//!
//! The context is keyed by `(site_id, order_id)` and expires after 24 hours;
//! re-registering the same order overwrites the previous entry.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::application::RequestAuthenticator;
use crate::domain::auth::{ProxyOperation, SignedEnvelope};
use crate::domain::foundation::ProxyError;
use crate::domain::transaction::OrderContext;
use crate::ports::OrderContextStore;

#[derive(Debug, Clone)]
pub struct RegisterOrderCommand {
    pub api_key: String,
    /// Base64-encoded JSON with at least order_id, order_total, currency.
    pub order_data_b64: String,
    pub envelope: Option<SignedEnvelope>,
}

#[derive(Debug, Clone)]
pub struct RegisterOrderResult {
    pub order_id: String,
}

pub struct RegisterOrderHandler {
    authenticator: Arc<RequestAuthenticator>,
    contexts: Arc<dyn OrderContextStore>,
}

impl RegisterOrderHandler {
    pub fn new(
        authenticator: Arc<RequestAuthenticator>,
        contexts: Arc<dyn OrderContextStore>,
    ) -> Self {
        Self {
            authenticator,
            contexts,
        }
    }

    pub async fn handle(
        &self,
        cmd: RegisterOrderCommand,
    ) -> Result<RegisterOrderResult, ProxyError> {
        let site = self
            .authenticator
            .authenticate(
                ProxyOperation::RegisterOrder,
                &cmd.api_key,
                cmd.envelope.as_ref(),
                &cmd.order_data_b64,
            )
            .await?;

        if cmd.order_data_b64.is_empty() {
            return Err(ProxyError::validation("order_data is required"));
        }

        let decoded = BASE64
            .decode(cmd.order_data_b64.as_bytes())
            .map_err(|_| ProxyError::validation("order_data is not valid base64"))?;
        let json: serde_json::Value = serde_json::from_slice(&decoded)
            .map_err(|_| ProxyError::validation("order_data is not valid JSON"))?;
        let context =
            OrderContext::from_json(json).map_err(|e| ProxyError::validation(e.to_string()))?;

        if let Some(claimed_url) = &context.site_url {
            if claimed_url != &site.url {
                tracing::warn!(
                    site_id = %site.id,
                    claimed_url = %claimed_url,
                    registered_url = %site.url,
                    "site URL mismatch in order registration"
                );
            }
        }

        let order_id = context.order_id.clone();
        self.contexts.put(site.id, &context).await?;

        tracing::info!(site_id = %site.id, order_id = %order_id, "order registered");

        Ok(RegisterOrderResult { order_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySiteRepository;
    use crate::adapters::order_context::InMemoryOrderContextStore;
    use crate::domain::site::{NewTenantSite, SiteStatus};
    use crate::ports::SiteRepository as _;
    use secrecy::SecretString;
    use serde_json::json;

    async fn handler() -> (RegisterOrderHandler, Arc<InMemoryOrderContextStore>) {
        let repo = Arc::new(InMemorySiteRepository::new());
        repo.create(NewTenantSite {
            url: "https://shop.example.com".to_string(),
            name: "Example Shop".to_string(),
            api_key: "key-1".to_string(),
            api_secret: SecretString::new("secret".to_string()),
            status: SiteStatus::Active,
        })
        .await
        .unwrap();
        let contexts = Arc::new(InMemoryOrderContextStore::new());
        let handler = RegisterOrderHandler::new(
            Arc::new(RequestAuthenticator::new(repo)),
            contexts.clone(),
        );
        (handler, contexts)
    }

    fn order_data(order_id: &str, total: &str) -> String {
        BASE64.encode(
            json!({
                "order_id": order_id,
                "order_total": total,
                "currency": "USD"
            })
            .to_string(),
        )
    }

    #[tokio::test]
    async fn registers_and_stores_the_context() {
        let (handler, contexts) = handler().await;
        let result = handler
            .handle(RegisterOrderCommand {
                api_key: "key-1".to_string(),
                order_data_b64: order_data("ORD-1", "19.99"),
                envelope: None,
            })
            .await
            .unwrap();
        assert_eq!(result.order_id, "ORD-1");

        let stored = contexts
            .get(crate::domain::foundation::SiteId::new(1), "ORD-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.order_total, "19.99");
    }

    #[tokio::test]
    async fn re_registration_overwrites_instead_of_duplicating() {
        let (handler, contexts) = handler().await;
        for total in ["19.99", "25.00"] {
            handler
                .handle(RegisterOrderCommand {
                    api_key: "key-1".to_string(),
                    order_data_b64: order_data("ORD-1", total),
                    envelope: None,
                })
                .await
                .unwrap();
        }

        let stored = contexts
            .get(crate::domain::foundation::SiteId::new(1), "ORD-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.order_total, "25.00");
        assert_eq!(contexts.len(), 1);
    }

    #[tokio::test]
    async fn missing_fields_are_a_validation_error() {
        let (handler, _) = handler().await;
        let incomplete = BASE64.encode(json!({"order_id": "ORD-1"}).to_string());
        let result = handler
            .handle(RegisterOrderCommand {
                api_key: "key-1".to_string(),
                order_data_b64: incomplete,
                envelope: None,
            })
            .await;
        assert!(matches!(result, Err(ProxyError::Validation(_))));
    }

    #[tokio::test]
    async fn garbage_payload_is_a_validation_error() {
        let (handler, _) = handler().await;
        let not_json = BASE64.encode("not json");
        for bad in ["", "!!!", not_json.as_str()] {
            let result = handler
                .handle(RegisterOrderCommand {
                    api_key: "key-1".to_string(),
                    order_data_b64: bad.to_string(),
                    envelope: None,
                })
                .await;
            assert!(matches!(result, Err(ProxyError::Validation(_))), "input: {bad}");
        }
    }
}
