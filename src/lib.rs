//! PayPal Relay - Multi-Tenant PayPal Checkout Proxy
//!
//! This crate lets independent storefronts delegate PayPal checkout to one
//! shared proxy that holds the real PayPal API credentials. Tenants
//! authenticate with per-site HMAC signatures; transactions are recorded in
//! a ledger whose state converges no matter which completion signal (tenant
//! capture call or PayPal webhook) arrives first.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
