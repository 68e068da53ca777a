//! Uniform request authentication.
//!
//! Every operation goes through `authenticate`: resolve the active site for
//! the presented API key, then enforce that operation's declared signature
//! policy. Handlers never make their own enforcement decisions.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::auth::{
    verify_signature, AuthError, ProxyOperation, SignaturePolicy, SignedEnvelope,
};
use crate::domain::foundation::ProxyError;
use crate::domain::site::TenantSite;
use crate::ports::SiteRepository;

pub struct RequestAuthenticator {
    sites: Arc<dyn SiteRepository>,
}

impl RequestAuthenticator {
    pub fn new(sites: Arc<dyn SiteRepository>) -> Self {
        Self { sites }
    }

    /// Resolve and authenticate the calling site.
    ///
    /// `payload` is the operation-specific string the tenant signed; it is
    /// only consulted when the policy (or the presence of an envelope under
    /// an `Optional` policy) demands signature verification.
    pub async fn authenticate(
        &self,
        operation: ProxyOperation,
        api_key: &str,
        envelope: Option<&SignedEnvelope>,
        payload: &str,
    ) -> Result<TenantSite, ProxyError> {
        if api_key.is_empty() {
            return Err(ProxyError::unauthenticated("missing API key"));
        }

        let site = self
            .sites
            .find_by_api_key(api_key)
            .await
            .map_err(ProxyError::from)?
            .ok_or_else(|| ProxyError::unauthenticated(AuthError::UnknownKey.to_string()))?;

        let now = Utc::now().timestamp();
        match operation.signature_policy() {
            SignaturePolicy::Required => {
                let envelope = envelope.ok_or_else(|| {
                    ProxyError::unauthenticated(AuthError::MissingSignature.to_string())
                })?;
                verify_signature(&site, envelope, payload, now)
                    .map_err(|e| ProxyError::unauthenticated(e.to_string()))?;
            }
            SignaturePolicy::Optional => {
                if let Some(envelope) = envelope {
                    verify_signature(&site, envelope, payload, now)
                        .map_err(|e| ProxyError::unauthenticated(e.to_string()))?;
                }
            }
            SignaturePolicy::None => {}
        }

        Ok(site)
    }
}
