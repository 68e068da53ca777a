//! PayPal webhook events as a closed set of tagged variants.
//!
//! Known event kinds are parsed into explicit structures; everything else is
//! kept as an opaque accepted-but-ignored variant so the webhook endpoint
//! never has to reject an event type it does not understand.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventParseError {
    #[error("event has no event_type field")]
    MissingEventType,
    #[error("event resource is missing {0}")]
    MissingResourceField(&'static str),
}

/// An inbound PayPal event, keyed by event type.
#[derive(Debug, Clone, PartialEq)]
pub enum PaypalEvent {
    /// `PAYMENT.CAPTURE.COMPLETED`: a capture settled.
    CaptureCompleted {
        capture_id: String,
        paypal_order_id: String,
        /// The full event envelope, kept for the audit snapshot.
        raw: Value,
    },
    /// `PAYMENT.CAPTURE.DENIED`: a capture was refused.
    CaptureDenied {
        capture_id: String,
        paypal_order_id: String,
        reason: Option<String>,
        raw: Value,
    },
    /// Any other event type: accepted, logged, ignored.
    Other { event_type: String, raw: Value },
}

impl PaypalEvent {
    /// Parse a webhook envelope.
    ///
    /// Capture events must carry the capture id (`resource.id`) and the
    /// related PayPal order id
    /// (`resource.supplementary_data.related_ids.order_id`).
    pub fn parse(value: Value) -> Result<Self, EventParseError> {
        let event_type = value
            .get("event_type")
            .and_then(Value::as_str)
            .ok_or(EventParseError::MissingEventType)?
            .to_string();

        match event_type.as_str() {
            "PAYMENT.CAPTURE.COMPLETED" => {
                let (capture_id, paypal_order_id) = capture_ids(&value)?;
                Ok(PaypalEvent::CaptureCompleted {
                    capture_id,
                    paypal_order_id,
                    raw: value,
                })
            }
            "PAYMENT.CAPTURE.DENIED" => {
                let (capture_id, paypal_order_id) = capture_ids(&value)?;
                let reason = value
                    .pointer("/resource/status_details/reason")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Ok(PaypalEvent::CaptureDenied {
                    capture_id,
                    paypal_order_id,
                    reason,
                    raw: value,
                })
            }
            _ => Ok(PaypalEvent::Other {
                event_type,
                raw: value,
            }),
        }
    }

    pub fn event_type(&self) -> &str {
        match self {
            PaypalEvent::CaptureCompleted { .. } => "PAYMENT.CAPTURE.COMPLETED",
            PaypalEvent::CaptureDenied { .. } => "PAYMENT.CAPTURE.DENIED",
            PaypalEvent::Other { event_type, .. } => event_type,
        }
    }
}

fn capture_ids(value: &Value) -> Result<(String, String), EventParseError> {
    let capture_id = value
        .pointer("/resource/id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(EventParseError::MissingResourceField("resource.id"))?
        .to_string();

    let paypal_order_id = value
        .pointer("/resource/supplementary_data/related_ids/order_id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(EventParseError::MissingResourceField(
            "supplementary_data.related_ids.order_id",
        ))?
        .to_string();

    Ok((capture_id, paypal_order_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn completed_envelope() -> Value {
        json!({
            "id": "WH-1",
            "event_type": "PAYMENT.CAPTURE.COMPLETED",
            "resource": {
                "id": "CAP-9",
                "status": "COMPLETED",
                "supplementary_data": {
                    "related_ids": { "order_id": "PP-123" }
                }
            }
        })
    }

    #[test]
    fn parses_capture_completed() {
        let event = PaypalEvent::parse(completed_envelope()).unwrap();
        match event {
            PaypalEvent::CaptureCompleted {
                capture_id,
                paypal_order_id,
                ..
            } => {
                assert_eq!(capture_id, "CAP-9");
                assert_eq!(paypal_order_id, "PP-123");
            }
            other => panic!("expected CaptureCompleted, got {:?}", other),
        }
    }

    #[test]
    fn parses_capture_denied_with_reason() {
        let event = PaypalEvent::parse(json!({
            "event_type": "PAYMENT.CAPTURE.DENIED",
            "resource": {
                "id": "CAP-9",
                "status_details": { "reason": "TRANSACTION_LIMIT_EXCEEDED" },
                "supplementary_data": {
                    "related_ids": { "order_id": "PP-123" }
                }
            }
        }))
        .unwrap();

        match event {
            PaypalEvent::CaptureDenied { reason, .. } => {
                assert_eq!(reason.as_deref(), Some("TRANSACTION_LIMIT_EXCEEDED"));
            }
            other => panic!("expected CaptureDenied, got {:?}", other),
        }
    }

    #[test]
    fn unknown_event_types_become_other() {
        let event = PaypalEvent::parse(json!({
            "event_type": "CHECKOUT.ORDER.APPROVED",
            "resource": {}
        }))
        .unwrap();

        assert!(matches!(event, PaypalEvent::Other { .. }));
        assert_eq!(event.event_type(), "CHECKOUT.ORDER.APPROVED");
    }

    #[test]
    fn missing_event_type_is_rejected() {
        assert_eq!(
            PaypalEvent::parse(json!({"resource": {}})),
            Err(EventParseError::MissingEventType)
        );
    }

    #[test]
    fn capture_event_without_order_id_is_rejected() {
        let result = PaypalEvent::parse(json!({
            "event_type": "PAYMENT.CAPTURE.COMPLETED",
            "resource": { "id": "CAP-9" }
        }));
        assert_eq!(
            result,
            Err(EventParseError::MissingResourceField(
                "supplementary_data.related_ids.order_id"
            ))
        );
    }

    #[test]
    fn raw_envelope_is_preserved_for_audit() {
        let envelope = completed_envelope();
        let event = PaypalEvent::parse(envelope.clone()).unwrap();
        match event {
            PaypalEvent::CaptureCompleted { raw, .. } => assert_eq!(raw, envelope),
            other => panic!("expected CaptureCompleted, got {:?}", other),
        }
    }
}
