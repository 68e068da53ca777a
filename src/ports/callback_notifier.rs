//! One-way notification back to the tenant's own callback endpoint.
//!
//! Fire-and-forget by contract: the ledger's state is already durable and
//! authoritative when a notification goes out, so delivery failures are
//! logged by the implementation and never propagated.

use async_trait::async_trait;

use crate::domain::site::TenantSite;

/// Terminal outcome reported to the tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStatus {
    Completed,
    Failed,
}

impl CallbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackStatus::Completed => "completed",
            CallbackStatus::Failed => "failed",
        }
    }
}

/// Content of a tenant notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackNotification {
    pub order_id: String,
    pub paypal_order_id: String,
    pub status: CallbackStatus,
    /// Capture id, for completed payments.
    pub transaction_id: Option<String>,
    /// Provider denial reason, for failed payments.
    pub reason: Option<String>,
}

impl CallbackNotification {
    pub fn completed(
        order_id: impl Into<String>,
        paypal_order_id: impl Into<String>,
        transaction_id: impl Into<String>,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            paypal_order_id: paypal_order_id.into(),
            status: CallbackStatus::Completed,
            transaction_id: Some(transaction_id.into()),
            reason: None,
        }
    }

    pub fn failed(
        order_id: impl Into<String>,
        paypal_order_id: impl Into<String>,
        reason: Option<String>,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            paypal_order_id: paypal_order_id.into(),
            status: CallbackStatus::Failed,
            transaction_id: None,
            reason,
        }
    }
}

#[async_trait]
pub trait CallbackNotifier: Send + Sync {
    /// Deliver a signed notification to the site's callback endpoint.
    /// Never fails from the caller's perspective.
    async fn notify(&self, site: &TenantSite, notification: &CallbackNotification);
}
