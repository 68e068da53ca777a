//! CapturePaymentHandler - captures an approved PayPal order and records
//! completion in the ledger.
//!
//! The webhook may have already marked the transaction terminal by the time
//! the tenant's capture response lands; that race resolves in the ledger,
//! and losing it is not an error here.

use std::sync::Arc;

use crate::application::RequestAuthenticator;
use crate::domain::auth::{ProxyOperation, SignedEnvelope};
use crate::domain::foundation::ProxyError;
use crate::domain::transaction::TerminalStatus;
use crate::ports::{PaymentGateway, TransactionKey, TransactionLedger, TransitionOutcome};

#[derive(Debug, Clone)]
pub struct CapturePaymentCommand {
    pub api_key: String,
    pub paypal_order_id: String,
    pub envelope: Option<SignedEnvelope>,
}

#[derive(Debug, Clone)]
pub struct CapturePaymentResult {
    /// The capture id PayPal assigned, when present in the response.
    pub transaction_id: Option<String>,
    pub status: String,
}

pub struct CapturePaymentHandler {
    authenticator: Arc<RequestAuthenticator>,
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn TransactionLedger>,
}

impl CapturePaymentHandler {
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
        cmd: CapturePaymentCommand,
    ) -> Result<CapturePaymentResult, ProxyError> {
        let site = self
            .authenticator
            .authenticate(
                ProxyOperation::CapturePayment,
                &cmd.api_key,
                cmd.envelope.as_ref(),
                &cmd.paypal_order_id,
            )
            .await?;

        if cmd.paypal_order_id.trim().is_empty() {
            return Err(ProxyError::validation("paypal_order_id is required"));
        }

        let capture = self.gateway.capture_order(&cmd.paypal_order_id).await?;
        let transaction_id = capture.capture_id().map(str::to_string);

        let key = TransactionKey::for_paypal_order(&cmd.paypal_order_id).with_site(site.id);
        let outcome = self
            .ledger
            .transition(&key, TerminalStatus::Completed, capture.raw.clone())
            .await?;

        match outcome {
            TransitionOutcome::Applied(_) => {}
            TransitionOutcome::AlreadyTerminal(tx) => {
                tracing::info!(
                    site_id = %site.id,
                    paypal_order_id = %cmd.paypal_order_id,
                    status = tx.status.as_str(),
                    "capture raced an earlier completion signal"
                );
            }
            TransitionOutcome::NotFound => {
                tracing::warn!(
                    site_id = %site.id,
                    paypal_order_id = %cmd.paypal_order_id,
                    "no pending transaction for captured order"
                );
            }
        }

        Ok(CapturePaymentResult {
            transaction_id,
            status: capture.status,
        })
    }
}
