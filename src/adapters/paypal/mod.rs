//! PayPal REST API adapter.

mod gateway;

pub use gateway::{PaypalEnvironment, PaypalGateway, PaypalGatewayConfig};
