//! In-memory order context store with expiry.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use async_trait::async_trait;

use crate::domain::foundation::SiteId;
use crate::domain::transaction::{OrderContext, ORDER_CONTEXT_TTL};
use crate::ports::{ContextStoreError, OrderContextStore};

#[derive(Default)]
pub struct InMemoryOrderContextStore {
    entries: Mutex<HashMap<(i64, String), (OrderContext, Instant)>>,
}

impl InMemoryOrderContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .expect("context store lock")
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OrderContextStore for InMemoryOrderContextStore {
    async fn put(
        &self,
        site_id: SiteId,
        context: &OrderContext,
    ) -> Result<(), ContextStoreError> {
        let mut entries = self.entries.lock().expect("context store lock");
        let now = Instant::now();
        // Sweep anything already expired while we hold the lock.
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        entries.insert(
            (site_id.as_i64(), context.order_id.clone()),
            (context.clone(), now + ORDER_CONTEXT_TTL),
        );
        Ok(())
    }

    async fn get(
        &self,
        site_id: SiteId,
        order_id: &str,
    ) -> Result<Option<OrderContext>, ContextStoreError> {
        let mut entries = self.entries.lock().expect("context store lock");
        let key = (site_id.as_i64(), order_id.to_string());
        match entries.get(&key) {
            Some((context, expires_at)) if *expires_at > Instant::now() => {
                Ok(Some(context.clone()))
            }
            Some(_) => {
                entries.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(order_id: &str, total: &str) -> OrderContext {
        OrderContext::from_json(json!({
            "order_id": order_id,
            "order_total": total,
            "currency": "USD"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = InMemoryOrderContextStore::new();
        store
            .put(SiteId::new(7), &context("ORD-1", "19.99"))
            .await
            .unwrap();

        let found = store.get(SiteId::new(7), "ORD-1").await.unwrap().unwrap();
        assert_eq!(found.order_total, "19.99");
    }

    #[tokio::test]
    async fn entries_are_scoped_by_site() {
        let store = InMemoryOrderContextStore::new();
        store
            .put(SiteId::new(7), &context("ORD-1", "19.99"))
            .await
            .unwrap();

        assert!(store.get(SiteId::new(8), "ORD-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn overwrite_keeps_a_single_entry() {
        let store = InMemoryOrderContextStore::new();
        store
            .put(SiteId::new(7), &context("ORD-1", "19.99"))
            .await
            .unwrap();
        store
            .put(SiteId::new(7), &context("ORD-1", "25.00"))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        let found = store.get(SiteId::new(7), "ORD-1").await.unwrap().unwrap();
        assert_eq!(found.order_total, "25.00");
    }

    #[tokio::test]
    async fn missing_orders_return_none() {
        let store = InMemoryOrderContextStore::new();
        assert!(store.get(SiteId::new(7), "ORD-404").await.unwrap().is_none());
    }
}
