//! Ports: the interfaces the protocol core depends on.
//!
//! Storage, the PayPal gateway, the order-context cache, and the tenant
//! notifier are all injected through these traits; each has one
//! implementation per target engine under `adapters/`.

mod callback_notifier;
mod order_context_store;
mod payment_gateway;
mod site_repository;
mod transaction_ledger;

pub use callback_notifier::{CallbackNotification, CallbackNotifier, CallbackStatus};
pub use order_context_store::{ContextStoreError, OrderContextStore};
pub use payment_gateway::{
    CreateOrderRequest, GatewayError, PaymentGateway, WebhookVerification,
};
pub use site_repository::{SiteRepository, SiteRepositoryError};
pub use transaction_ledger::{
    LedgerError, NewTransaction, TransactionKey, TransactionLedger, TransactionQuery,
    TransitionOutcome,
};
