//! PostgreSQL implementation of TransactionLedger.
//!
//! The terminal transition is one conditional `UPDATE … WHERE status =
//! 'pending'`, so the database serializes racing completion signals per row:
//! exactly one caller gets the updated row back, and the other learns the
//! winner's status from a follow-up read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{SiteId, TransactionId};
use crate::domain::transaction::{Amount, TerminalStatus, Transaction, TransactionStatus};
use crate::ports::{
    LedgerError, NewTransaction, TransactionKey, TransactionLedger, TransactionQuery,
    TransitionOutcome,
};

pub struct PostgresTransactionLedger {
    pool: PgPool,
}

impl PostgresTransactionLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a ledger transaction.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    site_id: i64,
    order_id: String,
    paypal_order_id: String,
    amount_minor: i64,
    currency: String,
    status: String,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    transaction_data: Option<serde_json::Value>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = LedgerError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let status = parse_status(&row.status)?;
        Ok(Transaction {
            id: TransactionId::new(row.id),
            site_id: SiteId::new(row.site_id),
            order_id: row.order_id,
            paypal_order_id: row.paypal_order_id,
            amount: Amount::from_minor_units(row.amount_minor),
            currency: row.currency,
            status,
            created_at: row.created_at,
            completed_at: row.completed_at,
            transaction_data: row.transaction_data,
        })
    }
}

fn parse_status(s: &str) -> Result<TransactionStatus, LedgerError> {
    TransactionStatus::parse(s)
        .ok_or_else(|| LedgerError::Storage(format!("invalid transaction status value: {}", s)))
}

const TX_COLUMNS: &str = "id, site_id, order_id, paypal_order_id, amount_minor, currency, \
                          status, created_at, completed_at, transaction_data";

#[async_trait]
impl TransactionLedger for PostgresTransactionLedger {
    async fn record_pending(&self, tx: NewTransaction) -> Result<Transaction, LedgerError> {
        let row: TransactionRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO transactions
                (site_id, order_id, paypal_order_id, amount_minor, currency, status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            ON CONFLICT (site_id, order_id, paypal_order_id) DO UPDATE SET
                amount_minor = EXCLUDED.amount_minor,
                currency = EXCLUDED.currency,
                status = 'pending',
                created_at = now(),
                completed_at = NULL
            RETURNING {}
            "#,
            TX_COLUMNS
        ))
        .bind(tx.site_id.as_i64())
        .bind(&tx.order_id)
        .bind(&tx.paypal_order_id)
        .bind(tx.amount.minor_units())
        .bind(&tx.currency)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| LedgerError::Storage(format!("failed to record transaction: {}", e)))?;

        Transaction::try_from(row)
    }

    async fn transition(
        &self,
        key: &TransactionKey,
        to: TerminalStatus,
        data: serde_json::Value,
    ) -> Result<TransitionOutcome, LedgerError> {
        let to_status: TransactionStatus = to.into();

        let updated: Option<TransactionRow> = sqlx::query_as(&format!(
            r#"
            UPDATE transactions SET
                status = $1,
                completed_at = CASE WHEN $1 = 'cancelled' THEN NULL ELSE now() END,
                transaction_data = $2
            WHERE paypal_order_id = $3
              AND ($4::bigint IS NULL OR site_id = $4)
              AND ($5::text IS NULL OR order_id = $5)
              AND status = 'pending'
            RETURNING {}
            "#,
            TX_COLUMNS
        ))
        .bind(to_status.as_str())
        .bind(&data)
        .bind(&key.paypal_order_id)
        .bind(key.site_id.map(|id| id.as_i64()))
        .bind(key.order_id.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::Storage(format!("failed to transition transaction: {}", e)))?;

        if let Some(row) = updated {
            return Ok(TransitionOutcome::Applied(Transaction::try_from(row)?));
        }

        // Nothing was pending. Distinguish a terminal row from no row at all.
        let existing: Option<TransactionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM transactions
            WHERE paypal_order_id = $1
              AND ($2::bigint IS NULL OR site_id = $2)
              AND ($3::text IS NULL OR order_id = $3)
            LIMIT 1
            "#,
            TX_COLUMNS
        ))
        .bind(&key.paypal_order_id)
        .bind(key.site_id.map(|id| id.as_i64()))
        .bind(key.order_id.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::Storage(format!("failed to read transaction: {}", e)))?;

        match existing {
            Some(row) => Ok(TransitionOutcome::AlreadyTerminal(Transaction::try_from(
                row,
            )?)),
            None => Ok(TransitionOutcome::NotFound),
        }
    }

    async fn find(&self, query: &TransactionQuery) -> Result<Option<Transaction>, LedgerError> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM transactions
            WHERE ($1::bigint IS NULL OR site_id = $1)
              AND ($2::text IS NULL OR order_id = $2)
              AND ($3::text IS NULL OR paypal_order_id = $3)
            LIMIT 1
            "#,
            TX_COLUMNS
        ))
        .bind(query.site_id.map(|id| id.as_i64()))
        .bind(query.order_id.as_deref())
        .bind(query.paypal_order_id.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::Storage(format!("failed to find transaction: {}", e)))?;

        row.map(Transaction::try_from).transpose()
    }
}
