//! ProcessWebhookHandler - ingests PayPal's asynchronous events and
//! converges the ledger.
//!
//! Delivery is at-least-once, so every path here is idempotent: a redelivered
//! completion for an already-terminal transaction is a no-op, and an event
//! for an unknown order is logged and acknowledged rather than retried.
//! After a transition applies, the owning tenant is notified through the
//! callback notifier; the ledger is authoritative whether or not that
//! notification lands.

use std::sync::Arc;

use crate::domain::foundation::ProxyError;
use crate::domain::paypal::PaypalEvent;
use crate::domain::transaction::{TerminalStatus, Transaction};
use crate::ports::{
    CallbackNotification, CallbackNotifier, PaymentGateway, SiteRepository, TransactionKey,
    TransactionLedger, TransitionOutcome, WebhookVerification,
};

/// The transmission headers PayPal attaches to each webhook delivery.
#[derive(Debug, Clone)]
pub struct WebhookTransmission {
    pub transmission_id: String,
    pub transmission_time: String,
    pub transmission_sig: String,
    pub cert_url: String,
    pub auth_algo: String,
}

#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    /// The parsed event envelope.
    pub payload: serde_json::Value,
    /// Present when the delivery carried PayPal's transmission headers.
    pub transmission: Option<WebhookTransmission>,
}

/// What processing an event amounted to. Every variant is acknowledged with
/// HTTP 200; only signature-verification failures are rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessWebhookResult {
    /// A pending transaction moved to completed and the tenant was notified.
    Completed {
        paypal_order_id: String,
        order_id: String,
    },
    /// A pending transaction moved to failed and the tenant was notified.
    Failed {
        paypal_order_id: String,
        order_id: String,
    },
    /// The transaction was already terminal; redelivery no-op.
    AlreadyResolved {
        paypal_order_id: String,
        status: String,
    },
    /// No transaction matches the event's order id.
    Unmatched { paypal_order_id: String },
    /// Event type we do not act on.
    Ignored { event_type: String },
    /// Understood event type with unusable content; logged, not retried.
    Invalid { reason: String },
}

pub struct ProcessWebhookHandler {
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn TransactionLedger>,
    sites: Arc<dyn SiteRepository>,
    notifier: Arc<dyn CallbackNotifier>,
    /// Whether inbound deliveries must pass PayPal's signature verification.
    verify_signatures: bool,
}

impl ProcessWebhookHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        ledger: Arc<dyn TransactionLedger>,
        sites: Arc<dyn SiteRepository>,
        notifier: Arc<dyn CallbackNotifier>,
        verify_signatures: bool,
    ) -> Self {
        Self {
            gateway,
            ledger,
            sites,
            notifier,
            verify_signatures,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProcessWebhookCommand,
    ) -> Result<ProcessWebhookResult, ProxyError> {
        if self.verify_signatures {
            self.verify_transmission(&cmd).await?;
        } else {
            tracing::warn!("webhook signature verification is disabled");
        }

        let event = match PaypalEvent::parse(cmd.payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "unusable webhook event");
                return Ok(ProcessWebhookResult::Invalid {
                    reason: e.to_string(),
                });
            }
        };

        tracing::info!(event_type = event.event_type(), "received PayPal webhook");

        match event {
            PaypalEvent::CaptureCompleted {
                capture_id,
                paypal_order_id,
                raw,
            } => {
                self.reconcile(
                    paypal_order_id,
                    TerminalStatus::Completed,
                    raw,
                    move |tx| {
                        CallbackNotification::completed(&tx.order_id, &tx.paypal_order_id, &capture_id)
                    },
                )
                .await
            }
            PaypalEvent::CaptureDenied {
                paypal_order_id,
                reason,
                raw,
                ..
            } => {
                self.reconcile(paypal_order_id, TerminalStatus::Failed, raw, move |tx| {
                    CallbackNotification::failed(&tx.order_id, &tx.paypal_order_id, reason.clone())
                })
                .await
            }
            PaypalEvent::Other { event_type, .. } => {
                tracing::info!(event_type = %event_type, "ignoring unhandled webhook event");
                Ok(ProcessWebhookResult::Ignored { event_type })
            }
        }
    }

    async fn verify_transmission(&self, cmd: &ProcessWebhookCommand) -> Result<(), ProxyError> {
        let transmission = cmd.transmission.as_ref().ok_or_else(|| {
            ProxyError::unauthenticated("webhook delivery is missing transmission headers")
        })?;

        let authentic = self
            .gateway
            .verify_webhook_signature(WebhookVerification {
                transmission_id: transmission.transmission_id.clone(),
                transmission_time: transmission.transmission_time.clone(),
                transmission_sig: transmission.transmission_sig.clone(),
                cert_url: transmission.cert_url.clone(),
                auth_algo: transmission.auth_algo.clone(),
                event: cmd.payload.clone(),
            })
            .await?;

        if !authentic {
            tracing::warn!("webhook signature verification failed");
            return Err(ProxyError::unauthenticated(
                "webhook signature verification failed",
            ));
        }
        Ok(())
    }

    async fn reconcile(
        &self,
        paypal_order_id: String,
        to: TerminalStatus,
        raw: serde_json::Value,
        build_notification: impl FnOnce(&Transaction) -> CallbackNotification,
    ) -> Result<ProcessWebhookResult, ProxyError> {
        let key = TransactionKey::for_paypal_order(&paypal_order_id);
        match self.ledger.transition(&key, to, raw).await? {
            TransitionOutcome::Applied(tx) => {
                let notification = build_notification(&tx);
                self.notify_owner(&tx, &notification).await;
                match to {
                    TerminalStatus::Completed => Ok(ProcessWebhookResult::Completed {
                        paypal_order_id,
                        order_id: tx.order_id,
                    }),
                    _ => Ok(ProcessWebhookResult::Failed {
                        paypal_order_id,
                        order_id: tx.order_id,
                    }),
                }
            }
            TransitionOutcome::AlreadyTerminal(tx) => {
                tracing::info!(
                    paypal_order_id = %paypal_order_id,
                    status = tx.status.as_str(),
                    "webhook redelivery for terminal transaction"
                );
                Ok(ProcessWebhookResult::AlreadyResolved {
                    paypal_order_id,
                    status: tx.status.as_str().to_string(),
                })
            }
            TransitionOutcome::NotFound => {
                tracing::warn!(
                    paypal_order_id = %paypal_order_id,
                    "no pending transaction for webhook event"
                );
                Ok(ProcessWebhookResult::Unmatched { paypal_order_id })
            }
        }
    }

    async fn notify_owner(&self, tx: &Transaction, notification: &CallbackNotification) {
        match self.sites.find_by_id(tx.site_id).await {
            Ok(Some(site)) => self.notifier.notify(&site, notification).await,
            Ok(None) => {
                tracing::error!(
                    site_id = %tx.site_id,
                    transaction_id = %tx.id,
                    "owning site not found for transaction"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, site_id = %tx.site_id, "site lookup failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemorySiteRepository, InMemoryTransactionLedger};
    use crate::domain::foundation::SiteId;
    use crate::domain::paypal::{CaptureDetails, OrderDetails, PaypalOrder};
    use crate::domain::site::{NewTenantSite, SiteStatus, TenantSite};
    use crate::domain::transaction::{Amount, TransactionStatus};
    use crate::ports::{
        CreateOrderRequest, GatewayError, NewTransaction, SiteRepository as _, TransactionQuery,
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct StubGateway {
        webhook_authentic: bool,
    }

    #[async_trait]
    impl PaymentGateway for StubGateway {
        async fn create_order(
            &self,
            _request: CreateOrderRequest,
        ) -> Result<PaypalOrder, GatewayError> {
            unimplemented!("not used by this handler")
        }

        async fn capture_order(&self, _id: &str) -> Result<CaptureDetails, GatewayError> {
            unimplemented!("not used by this handler")
        }

        async fn get_order(&self, _id: &str) -> Result<OrderDetails, GatewayError> {
            unimplemented!("not used by this handler")
        }

        async fn verify_webhook_signature(
            &self,
            _verification: WebhookVerification,
        ) -> Result<bool, GatewayError> {
            Ok(self.webhook_authentic)
        }
    }

    struct RecordingNotifier {
        notifications: Mutex<Vec<(TenantSite, CallbackNotification)>>,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                notifications: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<(TenantSite, CallbackNotification)> {
            self.notifications.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CallbackNotifier for RecordingNotifier {
        async fn notify(&self, site: &TenantSite, notification: &CallbackNotification) {
            self.notifications
                .lock()
                .unwrap()
                .push((site.clone(), notification.clone()));
        }
    }

    struct Fixture {
        handler: ProcessWebhookHandler,
        ledger: Arc<InMemoryTransactionLedger>,
        notifier: Arc<RecordingNotifier>,
    }

    async fn fixture(verify_signatures: bool, webhook_authentic: bool) -> Fixture {
        let sites = Arc::new(InMemorySiteRepository::new());
        sites
            .create(NewTenantSite {
                url: "https://shop.example.com".to_string(),
                name: "Example Shop".to_string(),
                api_key: "key-1".to_string(),
                api_secret: secrecy::SecretString::new("secret".to_string()),
                status: SiteStatus::Active,
            })
            .await
            .unwrap();
        let ledger = Arc::new(InMemoryTransactionLedger::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let handler = ProcessWebhookHandler::new(
            Arc::new(StubGateway { webhook_authentic }),
            ledger.clone(),
            sites,
            notifier.clone(),
            verify_signatures,
        );
        Fixture {
            handler,
            ledger,
            notifier,
        }
    }

    async fn seed_pending(ledger: &InMemoryTransactionLedger) {
        ledger
            .record_pending(NewTransaction {
                site_id: SiteId::new(1),
                order_id: "ORD-1".to_string(),
                paypal_order_id: "PP-123".to_string(),
                amount: Amount::parse("19.99").unwrap(),
                currency: "USD".to_string(),
            })
            .await
            .unwrap();
    }

    fn completed_event() -> serde_json::Value {
        json!({
            "id": "WH-1",
            "event_type": "PAYMENT.CAPTURE.COMPLETED",
            "resource": {
                "id": "CAP-9",
                "supplementary_data": {
                    "related_ids": { "order_id": "PP-123" }
                }
            }
        })
    }

    fn denied_event() -> serde_json::Value {
        json!({
            "id": "WH-2",
            "event_type": "PAYMENT.CAPTURE.DENIED",
            "resource": {
                "id": "CAP-9",
                "status_details": { "reason": "TRANSACTION_REFUSED" },
                "supplementary_data": {
                    "related_ids": { "order_id": "PP-123" }
                }
            }
        })
    }

    fn command(payload: serde_json::Value) -> ProcessWebhookCommand {
        ProcessWebhookCommand {
            payload,
            transmission: None,
        }
    }

    #[tokio::test]
    async fn capture_completed_resolves_and_notifies() {
        let fx = fixture(false, true).await;
        seed_pending(&fx.ledger).await;

        let result = fx.handler.handle(command(completed_event())).await.unwrap();
        assert_eq!(
            result,
            ProcessWebhookResult::Completed {
                paypal_order_id: "PP-123".to_string(),
                order_id: "ORD-1".to_string(),
            }
        );

        let tx = fx
            .ledger
            .find(&TransactionQuery {
                paypal_order_id: Some("PP-123".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Completed);

        let sent = fx.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.transaction_id.as_deref(), Some("CAP-9"));
    }

    #[tokio::test]
    async fn capture_denied_fails_the_transaction_with_reason() {
        let fx = fixture(false, true).await;
        seed_pending(&fx.ledger).await;

        let result = fx.handler.handle(command(denied_event())).await.unwrap();
        assert_eq!(
            result,
            ProcessWebhookResult::Failed {
                paypal_order_id: "PP-123".to_string(),
                order_id: "ORD-1".to_string(),
            }
        );

        let sent = fx.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.reason.as_deref(), Some("TRANSACTION_REFUSED"));
    }

    #[tokio::test]
    async fn redelivery_after_resolution_is_a_no_op() {
        let fx = fixture(false, true).await;
        seed_pending(&fx.ledger).await;

        fx.handler.handle(command(completed_event())).await.unwrap();
        let second = fx.handler.handle(command(denied_event())).await.unwrap();

        assert_eq!(
            second,
            ProcessWebhookResult::AlreadyResolved {
                paypal_order_id: "PP-123".to_string(),
                status: "completed".to_string(),
            }
        );
        // Only the first delivery notified the tenant.
        assert_eq!(fx.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn event_for_unknown_order_is_acknowledged_unmatched() {
        let fx = fixture(false, true).await;

        let result = fx.handler.handle(command(completed_event())).await.unwrap();
        assert_eq!(
            result,
            ProcessWebhookResult::Unmatched {
                paypal_order_id: "PP-123".to_string(),
            }
        );
        assert!(fx.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn unknown_event_types_are_ignored() {
        let fx = fixture(false, true).await;
        let result = fx
            .handler
            .handle(command(json!({
                "event_type": "BILLING.PLAN.ACTIVATED",
                "resource": {}
            })))
            .await
            .unwrap();
        assert_eq!(
            result,
            ProcessWebhookResult::Ignored {
                event_type: "BILLING.PLAN.ACTIVATED".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn malformed_capture_event_is_invalid_but_acknowledged() {
        let fx = fixture(false, true).await;
        let result = fx
            .handler
            .handle(command(json!({
                "event_type": "PAYMENT.CAPTURE.COMPLETED",
                "resource": {}
            })))
            .await
            .unwrap();
        assert!(matches!(result, ProcessWebhookResult::Invalid { .. }));
    }

    #[tokio::test]
    async fn failed_signature_verification_rejects_the_event() {
        let fx = fixture(true, false).await;
        seed_pending(&fx.ledger).await;

        let result = fx
            .handler
            .handle(ProcessWebhookCommand {
                payload: completed_event(),
                transmission: Some(WebhookTransmission {
                    transmission_id: "t-1".to_string(),
                    transmission_time: "2026-01-01T00:00:00Z".to_string(),
                    transmission_sig: "sig".to_string(),
                    cert_url: "https://api.paypal.com/cert".to_string(),
                    auth_algo: "SHA256withRSA".to_string(),
                }),
            })
            .await;
        assert!(matches!(result, Err(ProxyError::Unauthenticated(_))));

        // No state change happened.
        let tx = fx
            .ledger
            .find(&TransactionQuery {
                paypal_order_id: Some("PP-123".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn missing_transmission_headers_reject_when_verification_enabled() {
        let fx = fixture(true, true).await;
        let result = fx.handler.handle(command(completed_event())).await;
        assert!(matches!(result, Err(ProxyError::Unauthenticated(_))));
    }
}
