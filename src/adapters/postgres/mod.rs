//! PostgreSQL implementations of the storage ports, via sqlx.

mod site_repository;
mod transaction_ledger;

pub use site_repository::PostgresSiteRepository;
pub use transaction_ledger::PostgresTransactionLedger;
