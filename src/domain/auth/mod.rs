//! Request authentication: HMAC signatures with replay protection, and the
//! per-operation enforcement policy.

mod policy;
mod signature;

pub use policy::{ProxyOperation, SignaturePolicy};
pub use signature::{
    compute_signature, verify_signature, AuthError, SignedEnvelope, REPLAY_WINDOW_SECS,
};
