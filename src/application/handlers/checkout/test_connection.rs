//! TestConnectionHandler - confirms a tenant's credentials resolve to an
//! active site.
//!
//! A mismatch between the claimed and registered site URL is logged, never
//! rejected: trust is anchored on the API key, not the URL.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::application::RequestAuthenticator;
use crate::domain::auth::{ProxyOperation, SignedEnvelope};
use crate::domain::foundation::ProxyError;

#[derive(Debug, Clone)]
pub struct TestConnectionCommand {
    pub api_key: String,
    /// Base64-encoded URL the tenant claims to be calling from.
    pub site_url_b64: String,
    pub envelope: Option<SignedEnvelope>,
}

#[derive(Debug, Clone)]
pub struct TestConnectionResult {
    pub site_name: String,
}

pub struct TestConnectionHandler {
    authenticator: Arc<RequestAuthenticator>,
}

impl TestConnectionHandler {
    pub fn new(authenticator: Arc<RequestAuthenticator>) -> Self {
        Self { authenticator }
    }

    pub async fn handle(
        &self,
        cmd: TestConnectionCommand,
    ) -> Result<TestConnectionResult, ProxyError> {
        let site = self
            .authenticator
            .authenticate(
                ProxyOperation::TestConnection,
                &cmd.api_key,
                cmd.envelope.as_ref(),
                &cmd.site_url_b64,
            )
            .await?;

        let claimed_url = BASE64
            .decode(cmd.site_url_b64.as_bytes())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(|| ProxyError::validation("site_url is not valid base64"))?;

        if claimed_url != site.url {
            tracing::warn!(
                site_id = %site.id,
                claimed_url = %claimed_url,
                registered_url = %site.url,
                "site URL mismatch in connection test"
            );
        }

        Ok(TestConnectionResult {
            site_name: site.name,
        })
    }
}
