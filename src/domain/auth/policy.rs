//! Per-operation signature enforcement policy.
//!
//! Enforcement is declared here in one table and evaluated uniformly by the
//! request authenticator, instead of each handler deciding ad hoc. The two
//! legacy GET bootstrap operations stay `Optional` for wire compatibility
//! with deployed tenants; every operation that moves money is `Required`.

/// The tenant-facing operations the proxy exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyOperation {
    TestConnection,
    RegisterOrder,
    CreateOrder,
    CapturePayment,
    VerifyPayment,
}

/// How strictly a signature is enforced for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignaturePolicy {
    /// Timestamp and hash must be present and valid.
    Required,
    /// Hash is verified when present; otherwise key existence suffices.
    Optional,
    /// Only the API key is checked.
    None,
}

impl ProxyOperation {
    /// The enforcement table. Tightening an operation is a one-line change.
    pub fn signature_policy(&self) -> SignaturePolicy {
        match self {
            ProxyOperation::TestConnection => SignaturePolicy::Optional,
            ProxyOperation::RegisterOrder => SignaturePolicy::Optional,
            ProxyOperation::CreateOrder => SignaturePolicy::Required,
            ProxyOperation::CapturePayment => SignaturePolicy::Required,
            ProxyOperation::VerifyPayment => SignaturePolicy::Required,
        }
    }
}
