//! HMAC-SHA256 request signatures.
//!
//! A tenant signs `timestamp || payload || api_key` with its site secret and
//! sends the hex digest alongside the timestamp. Verification recomputes the
//! digest and compares in constant time; timestamps outside a symmetric
//! one-hour window are rejected to stop replays while tolerating modest
//! clock skew.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::domain::site::TenantSite;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age (or future skew) of a signed request, in seconds.
/// A timestamp exactly this old still passes.
pub const REPLAY_WINDOW_SECS: i64 = 3600;

/// Reasons a request fails authentication.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("unknown or inactive API key")]
    UnknownKey,
    #[error("signature does not match")]
    BadSignature,
    #[error("authentication timestamp outside the accepted window")]
    Expired,
    #[error("request requires a timestamp and hash")]
    MissingSignature,
}

/// The timestamp+hash pair a tenant attaches to a signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    pub timestamp: i64,
    pub hash: String,
}

/// Compute the hex HMAC-SHA256 digest of `timestamp || payload || api_key`.
pub fn compute_signature(secret: &[u8], timestamp: i64, payload: &str, api_key: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(payload.as_bytes());
    mac.update(api_key.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a signed request against a resolved site at a given clock reading.
///
/// Pure check: callers decide what `payload` means per operation, and decide
/// what to do on failure.
pub fn verify_signature(
    site: &TenantSite,
    envelope: &SignedEnvelope,
    payload: &str,
    now: i64,
) -> Result<(), AuthError> {
    if (now - envelope.timestamp).abs() > REPLAY_WINDOW_SECS {
        return Err(AuthError::Expired);
    }

    let mut mac =
        HmacSha256::new_from_slice(site.secret_bytes()).expect("HMAC accepts any key size");
    mac.update(envelope.timestamp.to_string().as_bytes());
    mac.update(payload.as_bytes());
    mac.update(site.api_key.as_bytes());
    let expected = mac.finalize().into_bytes();

    let provided = hex::decode(&envelope.hash).map_err(|_| AuthError::BadSignature)?;
    if expected.as_slice().ct_eq(provided.as_slice()).unwrap_u8() != 1 {
        return Err(AuthError::BadSignature);
    }

    Ok(())
}
