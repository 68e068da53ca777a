//! Outbound tenant notification over HTTP.

mod http_notifier;

pub use http_notifier::{HttpCallbackNotifier, CALLBACK_PATH};
