//! Adapters: one implementation of each port per target engine.

pub mod http;
pub mod memory;
pub mod notifier;
pub mod order_context;
pub mod paypal;
pub mod postgres;
