//! Transaction ledger port: the single source of truth for payment state.
//!
//! Three independent callers write here (order creation, tenant capture,
//! webhook reconciliation). The implementation must serialize transitions
//! per logical transaction key so that racing completion signals produce
//! exactly one winner and the loser observes a no-op.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{ProxyError, SiteId};
use crate::domain::transaction::{Amount, TerminalStatus, Transaction};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<LedgerError> for ProxyError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Storage(msg) => ProxyError::storage(msg),
        }
    }
}

/// Fields for a new (or re-attempted) pending transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub site_id: SiteId,
    pub order_id: String,
    pub paypal_order_id: String,
    pub amount: Amount,
    pub currency: String,
}

/// Identifies the transaction a completion signal refers to.
///
/// The PayPal order id is always known; webhooks carry nothing else, while
/// tenant calls can narrow by site and order id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionKey {
    pub paypal_order_id: String,
    pub site_id: Option<SiteId>,
    pub order_id: Option<String>,
}

impl TransactionKey {
    /// Key as seen by the webhook reconciler: PayPal order id only.
    pub fn for_paypal_order(paypal_order_id: impl Into<String>) -> Self {
        Self {
            paypal_order_id: paypal_order_id.into(),
            site_id: None,
            order_id: None,
        }
    }

    pub fn with_site(mut self, site_id: SiteId) -> Self {
        self.site_id = Some(site_id);
        self
    }

    pub fn with_order(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }
}

/// Read-only lookup by any subset of the identity tuple.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionQuery {
    pub site_id: Option<SiteId>,
    pub order_id: Option<String>,
    pub paypal_order_id: Option<String>,
}

/// What a transition attempt observed.
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    /// This caller won: the row moved from pending to the terminal state.
    Applied(Transaction),
    /// Another signal got there first; the existing terminal row is
    /// returned unchanged (idempotent no-op).
    AlreadyTerminal(Transaction),
    /// No row matches the key: an out-of-order or duplicate signal, not a
    /// fatal error for the caller.
    NotFound,
}

#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Upsert on `(site_id, order_id, paypal_order_id)`.
    ///
    /// An existing row gets amount/currency/created_at refreshed and its
    /// status forced back to `pending` (re-attempt semantics); otherwise a
    /// new pending row is inserted.
    async fn record_pending(&self, tx: NewTransaction) -> Result<Transaction, LedgerError>;

    /// Atomically move the matching **pending** row to a terminal state,
    /// storing the audit snapshot. `completed_at` is stamped for
    /// `completed` and `failed` only; a cancelled row keeps it null.
    ///
    /// Must be a conditional update (`… where status = 'pending'`): under
    /// concurrent calls with the same key exactly one applies and the other
    /// observes `AlreadyTerminal` with the winner's status.
    async fn transition(
        &self,
        key: &TransactionKey,
        to: TerminalStatus,
        data: serde_json::Value,
    ) -> Result<TransitionOutcome, LedgerError>;

    async fn find(&self, query: &TransactionQuery) -> Result<Option<Transaction>, LedgerError>;
}
