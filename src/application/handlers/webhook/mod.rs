//! PayPal webhook reconciliation.

mod process_event;

pub use process_event::{
    ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult, WebhookTransmission,
};
