//! The transaction ledger's domain model and the pending-order staging data.

mod amount;
mod model;
mod order_context;

pub use amount::{Amount, AmountParseError};
pub use model::{TerminalStatus, Transaction, TransactionStatus};
pub use order_context::{OrderContext, OrderContextError, ORDER_CONTEXT_TTL};
