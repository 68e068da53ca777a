//! VerifyPaymentHandler - cross-checks a payment against PayPal and the
//! ledger.
//!
//! Self-heals a lost webhook: if PayPal says COMPLETED but the ledger row is
//! still pending, the row is transitioned to completed here. A row that
//! already failed is never flipped; its terminal state is reported back.

use std::sync::Arc;

use crate::application::RequestAuthenticator;
use crate::domain::auth::{ProxyOperation, SignedEnvelope};
use crate::domain::foundation::ProxyError;
use crate::domain::transaction::{TerminalStatus, TransactionStatus};
use crate::ports::{
    PaymentGateway, TransactionKey, TransactionLedger, TransactionQuery, TransitionOutcome,
};

#[derive(Debug, Clone)]
pub struct VerifyPaymentCommand {
    pub api_key: String,
    pub paypal_order_id: String,
    pub order_id: String,
    pub envelope: Option<SignedEnvelope>,
}

#[derive(Debug, Clone)]
pub struct VerifyPaymentResult {
    pub status: TransactionStatus,
    /// Capture id from the order details, when available.
    pub transaction_id: Option<String>,
    pub payer_email: Option<String>,
}

pub struct VerifyPaymentHandler {
    authenticator: Arc<RequestAuthenticator>,
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn TransactionLedger>,
}

impl VerifyPaymentHandler {
    pub fn new(
        authenticator: Arc<RequestAuthenticator>,
        gateway: Arc<dyn PaymentGateway>,
        ledger: Arc<dyn TransactionLedger>,
    ) -> Self {
        Self {
            authenticator,
            gateway,
            ledger,
        }
    }

    pub async fn handle(
        &self,
        cmd: VerifyPaymentCommand,
    ) -> Result<VerifyPaymentResult, ProxyError> {
        let payload = format!("{}{}", cmd.paypal_order_id, cmd.order_id);
        let site = self
            .authenticator
            .authenticate(
                ProxyOperation::VerifyPayment,
                &cmd.api_key,
                cmd.envelope.as_ref(),
                &payload,
            )
            .await?;

        if cmd.paypal_order_id.trim().is_empty() || cmd.order_id.trim().is_empty() {
            return Err(ProxyError::validation(
                "paypal_order_id and order_id are required",
            ));
        }

        let details = self.gateway.get_order(&cmd.paypal_order_id).await?;
        if !details.is_completed() {
            return Err(ProxyError::validation(format!(
                "payment has not been completed (status {})",
                details.status
            )));
        }

        let query = TransactionQuery {
            site_id: Some(site.id),
            order_id: Some(cmd.order_id.clone()),
            paypal_order_id: Some(cmd.paypal_order_id.clone()),
        };
        let transaction = self
            .ledger
            .find(&query)
            .await?
            .ok_or_else(|| ProxyError::not_found("transaction"))?;

        let status = if transaction.is_pending() {
            // Lost-webhook recovery: PayPal confirmed completion, so the
            // pending row is resolved here. If a webhook lands concurrently
            // the ledger still picks exactly one winner.
            let key = TransactionKey::for_paypal_order(&cmd.paypal_order_id)
                .with_site(site.id)
                .with_order(&cmd.order_id);
            match self
                .ledger
                .transition(&key, TerminalStatus::Completed, details.raw.clone())
                .await?
            {
                TransitionOutcome::Applied(tx) => {
                    tracing::info!(
                        site_id = %site.id,
                        paypal_order_id = %cmd.paypal_order_id,
                        "ledger self-healed from verification"
                    );
                    tx.status
                }
                TransitionOutcome::AlreadyTerminal(tx) => tx.status,
                TransitionOutcome::NotFound => transaction.status,
            }
        } else {
            transaction.status
        };

        Ok(VerifyPaymentResult {
            status,
            transaction_id: details.capture_id().map(str::to_string),
            payer_email: details.payer_email().map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemorySiteRepository, InMemoryTransactionLedger};
    use crate::domain::auth::compute_signature;
    use crate::domain::foundation::SiteId;
    use crate::domain::paypal::{CaptureDetails, OrderDetails, PaypalOrder};
    use crate::domain::site::{NewTenantSite, SiteStatus};
    use crate::domain::transaction::Amount;
    use crate::ports::{
        CreateOrderRequest, GatewayError, NewTransaction, SiteRepository as _,
        WebhookVerification,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use secrecy::SecretString;
    use serde_json::json;

    const SECRET: &str = "shared-secret";

    struct StubGateway {
        details: Result<OrderDetails, GatewayError>,
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
            self.details.clone()
        }

        async fn verify_webhook_signature(
            &self,
            _verification: WebhookVerification,
        ) -> Result<bool, GatewayError> {
            Ok(true)
        }
    }

    fn completed_details() -> OrderDetails {
        OrderDetails {
            status: "COMPLETED".to_string(),
            raw: json!({
                "id": "PP-123",
                "status": "COMPLETED",
                "payer": { "email_address": "buyer@example.com" },
                "purchase_units": [{
                    "payments": { "captures": [{ "id": "CAP-9" }] }
                }]
            }),
        }
    }

    async fn handler_with(
        gateway: StubGateway,
    ) -> (VerifyPaymentHandler, Arc<InMemoryTransactionLedger>) {
        let repo = Arc::new(InMemorySiteRepository::new());
        repo.create(NewTenantSite {
            url: "https://shop.example.com".to_string(),
            name: "Example Shop".to_string(),
            api_key: "key-1".to_string(),
            api_secret: SecretString::new(SECRET.to_string()),
            status: SiteStatus::Active,
        })
        .await
        .unwrap();
        let ledger = Arc::new(InMemoryTransactionLedger::new());
        let handler = VerifyPaymentHandler::new(
            Arc::new(RequestAuthenticator::new(repo)),
            Arc::new(gateway),
            ledger.clone(),
        );
        (handler, ledger)
    }

    fn command(paypal_order_id: &str, order_id: &str) -> VerifyPaymentCommand {
        let timestamp = Utc::now().timestamp();
        let payload = format!("{}{}", paypal_order_id, order_id);
        VerifyPaymentCommand {
            api_key: "key-1".to_string(),
            paypal_order_id: paypal_order_id.to_string(),
            order_id: order_id.to_string(),
            envelope: Some(SignedEnvelope {
                timestamp,
                hash: compute_signature(SECRET.as_bytes(), timestamp, &payload, "key-1"),
            }),
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

    #[tokio::test]
    async fn pending_row_is_self_healed_to_completed() {
        let (handler, ledger) = handler_with(StubGateway {
            details: Ok(completed_details()),
        })
        .await;
        seed_pending(&ledger).await;

        let result = handler.handle(command("PP-123", "ORD-1")).await.unwrap();
        assert_eq!(result.status, TransactionStatus::Completed);
        assert_eq!(result.transaction_id.as_deref(), Some("CAP-9"));
        assert_eq!(result.payer_email.as_deref(), Some("buyer@example.com"));

        let tx = ledger
            .find(&TransactionQuery {
                paypal_order_id: Some("PP-123".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Completed);
    }

    #[tokio::test]
    async fn failed_row_is_not_flipped_to_completed() {
        let (handler, ledger) = handler_with(StubGateway {
            details: Ok(completed_details()),
        })
        .await;
        seed_pending(&ledger).await;
        ledger
            .transition(
                &TransactionKey::for_paypal_order("PP-123"),
                TerminalStatus::Failed,
                json!({"reason": "DENIED"}),
            )
            .await
            .unwrap();

        let result = handler.handle(command("PP-123", "ORD-1")).await.unwrap();
        assert_eq!(result.status, TransactionStatus::Failed);

        let tx = ledger
            .find(&TransactionQuery {
                paypal_order_id: Some("PP-123".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Failed);
    }

    #[tokio::test]
    async fn incomplete_paypal_status_is_a_validation_error() {
        let (handler, ledger) = handler_with(StubGateway {
            details: Ok(OrderDetails {
                status: "APPROVED".to_string(),
                raw: json!({}),
            }),
        })
        .await;
        seed_pending(&ledger).await;

        let result = handler.handle(command("PP-123", "ORD-1")).await;
        assert!(matches!(result, Err(ProxyError::Validation(_))));
    }

    #[tokio::test]
    async fn missing_ledger_row_is_not_found() {
        let (handler, _) = handler_with(StubGateway {
            details: Ok(completed_details()),
        })
        .await;

        let result = handler.handle(command("PP-123", "ORD-1")).await;
        assert!(matches!(result, Err(ProxyError::NotFound(_))));
    }

    #[tokio::test]
    async fn other_tenants_rows_are_invisible() {
        let (handler, ledger) = handler_with(StubGateway {
            details: Ok(completed_details()),
        })
        .await;
        // Row belongs to a different site.
        ledger
            .record_pending(NewTransaction {
                site_id: SiteId::new(99),
                order_id: "ORD-1".to_string(),
                paypal_order_id: "PP-123".to_string(),
                amount: Amount::parse("19.99").unwrap(),
                currency: "USD".to_string(),
            })
            .await
            .unwrap();

        let result = handler.handle(command("PP-123", "ORD-1")).await;
        assert!(matches!(result, Err(ProxyError::NotFound(_))));
    }
}
