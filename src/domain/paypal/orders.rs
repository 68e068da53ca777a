//! Typed views over PayPal order, capture, and order-details responses.
//!
//! PayPal nests the useful identifiers deeply
//! (`purchase_units[0].payments.captures[0].id`); these types keep the raw
//! body for the audit trail and expose the few fields the protocol needs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A HATEOAS link from an order-create response. The tenant uses the
/// `approve` link to send the buyer to PayPal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalLink {
    pub href: String,
    pub rel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// A freshly created PayPal order.
#[derive(Debug, Clone, PartialEq)]
pub struct PaypalOrder {
    pub id: String,
    pub status: String,
    pub links: Vec<ApprovalLink>,
}

/// The response body of a capture call.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureDetails {
    pub status: String,
    /// Full response body, persisted as the transaction's audit snapshot.
    pub raw: Value,
}

impl CaptureDetails {
    /// The capture (provider transaction) id, if present.
    pub fn capture_id(&self) -> Option<&str> {
        first_capture_id(&self.raw)
    }
}

/// The response body of an order-details fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetails {
    pub status: String,
    pub raw: Value,
}

impl OrderDetails {
    pub fn is_completed(&self) -> bool {
        self.status == "COMPLETED"
    }

    pub fn capture_id(&self) -> Option<&str> {
        first_capture_id(&self.raw)
    }

    pub fn payer_email(&self) -> Option<&str> {
        self.raw
            .pointer("/payer/email_address")
            .and_then(Value::as_str)
    }
}

fn first_capture_id(body: &Value) -> Option<&str> {
    body.pointer("/purchase_units/0/payments/captures/0/id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
