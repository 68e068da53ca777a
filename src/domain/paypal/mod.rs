//! Typed views over PayPal's order responses and webhook events.

mod events;
mod orders;

pub use events::{EventParseError, PaypalEvent};
pub use orders::{ApprovalLink, CaptureDetails, OrderDetails, PaypalOrder};
