//! CreateOrderHandler - creates a PayPal order on the tenant's behalf and
//! records the pending transaction.
//!
//! The gateway call always happens before the ledger write; a gateway
//! failure leaves no ledger row behind.

use std::sync::Arc;

use crate::application::RequestAuthenticator;
use crate::domain::auth::{ProxyOperation, SignedEnvelope};
use crate::domain::foundation::ProxyError;
use crate::domain::paypal::ApprovalLink;
use crate::domain::transaction::Amount;
use crate::ports::{CreateOrderRequest, NewTransaction, PaymentGateway, TransactionLedger};

#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub api_key: String,
    pub order_id: String,
    /// Decimal amount exactly as the tenant sent it; also part of the
    /// signed payload.
    pub amount: String,
    pub currency: String,
    pub return_url: Option<String>,
    pub cancel_url: Option<String>,
    pub envelope: Option<SignedEnvelope>,
}

#[derive(Debug, Clone)]
pub struct CreateOrderResult {
    pub paypal_order_id: String,
    pub status: String,
    pub links: Vec<ApprovalLink>,
}

pub struct CreateOrderHandler {
    authenticator: Arc<RequestAuthenticator>,
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn TransactionLedger>,
}

impl CreateOrderHandler {
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

    pub async fn handle(&self, cmd: CreateOrderCommand) -> Result<CreateOrderResult, ProxyError> {
        // Signed payload is order_id followed by the amount as transmitted.
        let payload = format!("{}{}", cmd.order_id, cmd.amount);
        let site = self
            .authenticator
            .authenticate(
                ProxyOperation::CreateOrder,
                &cmd.api_key,
                cmd.envelope.as_ref(),
                &payload,
            )
            .await?;

        if cmd.order_id.trim().is_empty() {
            return Err(ProxyError::validation("order_id is required"));
        }
        if cmd.currency.trim().is_empty() {
            return Err(ProxyError::validation("currency is required"));
        }
        let amount =
            Amount::parse(&cmd.amount).map_err(|e| ProxyError::validation(e.to_string()))?;

        let order = self
            .gateway
            .create_order(CreateOrderRequest {
                amount,
                currency: cmd.currency.clone(),
                reference_id: Some(cmd.order_id.clone()),
                return_url: cmd.return_url.clone(),
                cancel_url: cmd.cancel_url.clone(),
            })
            .await?;

        self.ledger
            .record_pending(NewTransaction {
                site_id: site.id,
                order_id: cmd.order_id.clone(),
                paypal_order_id: order.id.clone(),
                amount,
                currency: cmd.currency,
            })
            .await?;

        tracing::info!(
            site_id = %site.id,
            order_id = %cmd.order_id,
            paypal_order_id = %order.id,
            "PayPal order created"
        );

        Ok(CreateOrderResult {
            paypal_order_id: order.id,
            status: order.status,
            links: order.links,
        })
    }
}
