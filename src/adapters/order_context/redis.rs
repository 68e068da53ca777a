//! Redis-backed order context store for multi-server deployments.
//!
//! Each context is stored under one key with `SET EX`, so expiry is enforced
//! by redis itself and re-registration overwrites in place.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::SiteId;
use crate::domain::transaction::{OrderContext, ORDER_CONTEXT_TTL};
use crate::ports::{ContextStoreError, OrderContextStore};

#[derive(Clone)]
pub struct RedisOrderContextStore {
    conn: MultiplexedConnection,
}

impl RedisOrderContextStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    fn key(site_id: SiteId, order_id: &str) -> String {
        format!("order-context:{}:{}", site_id, order_id)
    }
}

#[async_trait]
impl OrderContextStore for RedisOrderContextStore {
    async fn put(
        &self,
        site_id: SiteId,
        context: &OrderContext,
    ) -> Result<(), ContextStoreError> {
        let json = serde_json::to_string(context)
            .map_err(|e| ContextStoreError::Storage(e.to_string()))?;

        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(
            Self::key(site_id, &context.order_id),
            json,
            ORDER_CONTEXT_TTL.as_secs(),
        )
        .await
        .map_err(|e: redis::RedisError| ContextStoreError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn get(
        &self,
        site_id: SiteId,
        order_id: &str,
    ) -> Result<Option<OrderContext>, ContextStoreError> {
        let mut conn = self.conn.clone();
        let stored: Option<String> = conn
            .get(Self::key(site_id, order_id))
            .await
            .map_err(|e: redis::RedisError| ContextStoreError::Storage(e.to_string()))?;

        stored
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| ContextStoreError::Storage(e.to_string()))
            })
            .transpose()
    }
}

impl std::fmt::Debug for RedisOrderContextStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisOrderContextStore").finish_non_exhaustive()
    }
}
