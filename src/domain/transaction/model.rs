//! Transaction records and their status state machine.
//!
//! A transaction is created `pending` when the proxy creates a PayPal order
//! on a tenant's behalf, and is moved to a terminal state by whichever
//! completion signal (tenant capture call or PayPal webhook) observes the
//! outcome first. Terminal states are final: once `completed`, `failed`, or
//! `cancelled`, no later signal may change the status again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SiteId, TransactionId};

use super::Amount;

/// Lifecycle states of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Awaiting a completion signal. The only non-terminal state.
    Pending,
    /// Payment captured.
    Completed,
    /// Capture denied or otherwise failed.
    Failed,
    /// Abandoned before resolution. Reachable only from `pending`.
    Cancelled,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransactionStatus::Pending),
            "completed" => Some(TransactionStatus::Completed),
            "failed" => Some(TransactionStatus::Failed),
            "cancelled" => Some(TransactionStatus::Cancelled),
            _ => None,
        }
    }
}

/// The states a pending transaction may move to.
///
/// Transitions are only ever pending -> terminal, so the ledger API accepts
/// this narrower type and invalid transitions are unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    Completed,
    Failed,
    Cancelled,
}

impl From<TerminalStatus> for TransactionStatus {
    fn from(terminal: TerminalStatus) -> Self {
        match terminal {
            TerminalStatus::Completed => TransactionStatus::Completed,
            TerminalStatus::Failed => TransactionStatus::Failed,
            TerminalStatus::Cancelled => TransactionStatus::Cancelled,
        }
    }
}

/// One attempted payment, owned by exactly one tenant site.
///
/// The tuple `(site_id, order_id, paypal_order_id)` identifies at most one
/// logical transaction; re-registering the same tuple refreshes the existing
/// row instead of duplicating it.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: TransactionId,
    pub site_id: SiteId,
    /// The tenant's own order identifier. Unique only per site.
    pub order_id: String,
    pub paypal_order_id: String,
    pub amount: Amount,
    pub currency: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    /// Set iff status is completed or failed: the time of terminal
    /// resolution, not necessarily success.
    pub completed_at: Option<DateTime<Utc>>,
    /// Opaque snapshot of the last gateway/webhook payload, for audit.
    pub transaction_data: Option<serde_json::Value>,
}

impl Transaction {
    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_is_the_only_non_terminal_state() {
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(TransactionStatus::Completed.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
        assert!(TransactionStatus::Cancelled.is_terminal());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::Completed,
            TransactionStatus::Failed,
            TransactionStatus::Cancelled,
        ] {
            assert_eq!(TransactionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TransactionStatus::parse("refunded"), None);
    }

    #[test]
    fn terminal_status_converts_to_transaction_status() {
        assert_eq!(
            TransactionStatus::from(TerminalStatus::Completed),
            TransactionStatus::Completed
        );
        assert_eq!(
            TransactionStatus::from(TerminalStatus::Failed),
            TransactionStatus::Failed
        );
        assert_eq!(
            TransactionStatus::from(TerminalStatus::Cancelled),
            TransactionStatus::Cancelled
        );
    }
}
