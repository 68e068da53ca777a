//! Short-lived staging store for registered order data.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{ProxyError, SiteId};
use crate::domain::transaction::OrderContext;

#[derive(Debug, Clone, Error)]
pub enum ContextStoreError {
    #[error("context store failure: {0}")]
    Storage(String),
}

impl From<ContextStoreError> for ProxyError {
    fn from(err: ContextStoreError) -> Self {
        match err {
            ContextStoreError::Storage(msg) => ProxyError::storage(msg),
        }
    }
}

/// Keyed by `(site_id, order_id)`; entries expire after
/// [`ORDER_CONTEXT_TTL`](crate::domain::transaction::ORDER_CONTEXT_TTL).
/// Re-registration overwrites the existing entry, never duplicates it.
#[async_trait]
pub trait OrderContextStore: Send + Sync {
    async fn put(&self, site_id: SiteId, context: &OrderContext)
        -> Result<(), ContextStoreError>;

    async fn get(
        &self,
        site_id: SiteId,
        order_id: &str,
    ) -> Result<Option<OrderContext>, ContextStoreError>;
}
