//! The five tenant-facing checkout operations.

mod capture_payment;
mod create_order;
mod register_order;
mod test_connection;
mod verify_payment;

pub use capture_payment::{CapturePaymentCommand, CapturePaymentHandler, CapturePaymentResult};
pub use create_order::{CreateOrderCommand, CreateOrderHandler, CreateOrderResult};
pub use register_order::{RegisterOrderCommand, RegisterOrderHandler, RegisterOrderResult};
pub use test_connection::{TestConnectionCommand, TestConnectionHandler, TestConnectionResult};
pub use verify_payment::{VerifyPaymentCommand, VerifyPaymentHandler, VerifyPaymentResult};
