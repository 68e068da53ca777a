//! In-memory TransactionLedger.
//!
//! A single mutex serializes all writes, which makes the conditional
//! transition atomic: the first terminal signal for a key wins and every
//! later one observes `AlreadyTerminal`.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::foundation::TransactionId;
use crate::domain::transaction::{TerminalStatus, Transaction, TransactionStatus};
use crate::ports::{
    LedgerError, NewTransaction, TransactionKey, TransactionLedger, TransactionQuery,
    TransitionOutcome,
};

pub struct InMemoryTransactionLedger {
    rows: Mutex<Vec<Transaction>>,
    next_id: AtomicI64,
}

impl InMemoryTransactionLedger {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn matches_key(row: &Transaction, key: &TransactionKey) -> bool {
        row.paypal_order_id == key.paypal_order_id
            && key.site_id.map_or(true, |site_id| row.site_id == site_id)
            && key
                .order_id
                .as_ref()
                .map_or(true, |order_id| &row.order_id == order_id)
    }
}

#[async_trait]
impl TransactionLedger for InMemoryTransactionLedger {
    async fn record_pending(&self, tx: NewTransaction) -> Result<Transaction, LedgerError> {
        let mut rows = self.rows.lock().expect("ledger lock");
        let now = Utc::now();

        if let Some(existing) = rows.iter_mut().find(|row| {
            row.site_id == tx.site_id
                && row.order_id == tx.order_id
                && row.paypal_order_id == tx.paypal_order_id
        }) {
            existing.amount = tx.amount;
            existing.currency = tx.currency;
            existing.status = TransactionStatus::Pending;
            existing.created_at = now;
            existing.completed_at = None;
            return Ok(existing.clone());
        }

        let row = Transaction {
            id: TransactionId::new(self.next_id.fetch_add(1, Ordering::SeqCst)),
            site_id: tx.site_id,
            order_id: tx.order_id,
            paypal_order_id: tx.paypal_order_id,
            amount: tx.amount,
            currency: tx.currency,
            status: TransactionStatus::Pending,
            created_at: now,
            completed_at: None,
            transaction_data: None,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn transition(
        &self,
        key: &TransactionKey,
        to: TerminalStatus,
        data: serde_json::Value,
    ) -> Result<TransitionOutcome, LedgerError> {
        let mut rows = self.rows.lock().expect("ledger lock");

        if let Some(row) = rows
            .iter_mut()
            .find(|row| Self::matches_key(row, key) && row.is_pending())
        {
            row.status = to.into();
            // completed_at marks resolution of a payment attempt; a
            // cancellation is terminal but never resolved.
            row.completed_at = match to {
                TerminalStatus::Cancelled => None,
                _ => Some(Utc::now()),
            };
            row.transaction_data = Some(data);
            return Ok(TransitionOutcome::Applied(row.clone()));
        }

        match rows.iter().find(|row| Self::matches_key(row, key)) {
            Some(terminal) => Ok(TransitionOutcome::AlreadyTerminal(terminal.clone())),
            None => Ok(TransitionOutcome::NotFound),
        }
    }

    async fn find(&self, query: &TransactionQuery) -> Result<Option<Transaction>, LedgerError> {
        let rows = self.rows.lock().expect("ledger lock");
        Ok(rows
            .iter()
            .find(|row| {
                query.site_id.map_or(true, |site_id| row.site_id == site_id)
                    && query
                        .order_id
                        .as_ref()
                        .map_or(true, |order_id| &row.order_id == order_id)
                    && query
                        .paypal_order_id
                        .as_ref()
                        .map_or(true, |pp| &row.paypal_order_id == pp)
            })
            .cloned())
    }
}
