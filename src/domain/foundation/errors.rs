//! Error taxonomy for the proxy protocol.
//!
//! Every tenant-facing operation resolves to one of these variants; the HTTP
//! layer maps them to status codes and a machine-readable payload. Internal
//! failures never leak storage or provider details beyond the provider's own
//! error message text.

use thiserror::Error;

/// Stable machine-readable error codes surfaced to tenants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Unauthenticated,
    ValidationError,
    GatewayError,
    NotFound,
    Conflict,
    InternalError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCode::Unauthenticated => "UNAUTHENTICATED",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::GatewayError => "GATEWAY_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Failure surface of every proxy operation.
#[derive(Debug, Clone, Error)]
pub enum ProxyError {
    /// Bad or missing signature, unknown or inactive API key.
    #[error("authentication failed: {0}")]
    Unauthenticated(String),

    /// Missing or malformed request fields.
    #[error("validation failed: {0}")]
    Validation(String),

    /// PayPal rejected the request or was unreachable. The message carries
    /// the provider's own error text.
    #[error("gateway error ({code}): {message}")]
    Gateway { code: String, message: String },

    /// No matching transaction (or site) for the presented identifiers.
    #[error("{0} not found")]
    NotFound(String),

    /// The transaction was already terminal; the existing status is reported
    /// back as a no-op, not a failure.
    #[error("transaction already terminal in status {status}")]
    Conflict { status: String },

    /// Storage failure. Rendered to tenants as a generic internal error.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl ProxyError {
    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        ProxyError::Unauthenticated(reason.into())
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        ProxyError::Validation(reason.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ProxyError::NotFound(what.into())
    }

    pub fn storage(reason: impl Into<String>) -> Self {
        ProxyError::Storage(reason.into())
    }

    /// The machine-readable code for the HTTP response body.
    pub fn code(&self) -> ErrorCode {
        match self {
            ProxyError::Unauthenticated(_) => ErrorCode::Unauthenticated,
            ProxyError::Validation(_) => ErrorCode::ValidationError,
            ProxyError::Gateway { .. } => ErrorCode::GatewayError,
            ProxyError::NotFound(_) => ErrorCode::NotFound,
            ProxyError::Conflict { .. } => ErrorCode::Conflict,
            ProxyError::Storage(_) => ErrorCode::InternalError,
        }
    }

    /// The message a tenant is allowed to see. Storage details stay in logs.
    pub fn public_message(&self) -> String {
        match self {
            ProxyError::Storage(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}
