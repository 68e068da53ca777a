//! HTTP adapters: the tenant-facing proxy API and the PayPal webhook
//! endpoint.

pub mod proxy;
