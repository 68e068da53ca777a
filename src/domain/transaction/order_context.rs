//! Pending order context: line-item and total data a tenant registers
//! before a PayPal order exists.
//!
//! Keyed by `(site_id, order_id)` and expires after 24 hours. Owned by the
//! protocol handlers only; the ledger never sees it.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// How long registered order data stays available.
pub const ORDER_CONTEXT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderContextError {
    #[error("order data is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Order data registered by a tenant ahead of checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderContext {
    pub order_id: String,
    pub order_total: String,
    pub currency: String,
    /// Tenant-claimed site URL, if sent. Compared (and only logged) against
    /// the registered URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,
    /// Everything else the tenant sent, kept verbatim for later use.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl OrderContext {
    /// Parse decoded order data, requiring `order_id`, `order_total`, and
    /// `currency` to be present and non-empty.
    pub fn from_json(value: serde_json::Value) -> Result<Self, OrderContextError> {
        let context: OrderContext = serde_json::from_value(value)
            .map_err(|e| OrderContextError::InvalidJson(e.to_string()))?;

        if context.order_id.trim().is_empty() {
            return Err(OrderContextError::MissingField("order_id"));
        }
        if context.order_total.trim().is_empty() {
            return Err(OrderContextError::MissingField("order_total"));
        }
        if context.currency.trim().is_empty() {
            return Err(OrderContextError::MissingField("currency"));
        }

        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_complete_order_data() {
        let context = OrderContext::from_json(json!({
            "order_id": "ORD-1",
            "order_total": "19.99",
            "currency": "USD",
            "site_url": "https://shop.example.com",
            "items": [{"name": "Widget", "qty": 2}]
        }))
        .unwrap();

        assert_eq!(context.order_id, "ORD-1");
        assert_eq!(context.order_total, "19.99");
        assert_eq!(context.currency, "USD");
        assert_eq!(context.site_url.as_deref(), Some("https://shop.example.com"));
        assert!(context.extra.contains_key("items"));
    }

    #[test]
    fn rejects_missing_required_fields() {
        let result = OrderContext::from_json(json!({
            "order_id": "ORD-1",
            "currency": "USD"
        }));
        assert!(matches!(result, Err(OrderContextError::InvalidJson(_))));

        let result = OrderContext::from_json(json!({
            "order_id": "",
            "order_total": "19.99",
            "currency": "USD"
        }));
        assert_eq!(result, Err(OrderContextError::MissingField("order_id")));
    }

    #[test]
    fn extra_fields_survive_a_round_trip() {
        let context = OrderContext::from_json(json!({
            "order_id": "ORD-2",
            "order_total": "5.00",
            "currency": "EUR",
            "customer_note": "leave at door"
        }))
        .unwrap();

        let value = serde_json::to_value(&context).unwrap();
        let reparsed = OrderContext::from_json(value).unwrap();
        assert_eq!(context, reparsed);
    }
}
