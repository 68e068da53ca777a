//! Application layer: one command handler per protocol operation, plus the
//! shared request authenticator.

mod authenticator;
pub mod handlers;

pub use authenticator::RequestAuthenticator;
