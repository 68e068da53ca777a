//! PayPal credential and environment settings.

use serde::Deserialize;

use crate::adapters::paypal::PaypalEnvironment;

use super::error::ValidationError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaypalConfig {
    /// REST client id for the shared proxy account.
    pub client_id: String,

    /// REST client secret.
    pub client_secret: String,

    /// Target environment: "sandbox" or "live".
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Webhook id from the PayPal dashboard. When set, inbound webhook
    /// deliveries are verified against PayPal before being trusted.
    pub webhook_id: Option<String>,
}

impl PaypalConfig {
    pub fn parsed_environment(&self) -> Result<PaypalEnvironment, ValidationError> {
        match self.environment.as_str() {
            "sandbox" => Ok(PaypalEnvironment::Sandbox),
            "live" => Ok(PaypalEnvironment::Live),
            other => Err(ValidationError::BadPaypalEnvironment(other.to_string())),
        }
    }

    /// Whether inbound webhooks can be verified against the provider.
    pub fn webhook_verification_enabled(&self) -> bool {
        self.webhook_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.client_id.is_empty() {
            return Err(ValidationError::Missing("paypal.client_id"));
        }
        if self.client_secret.is_empty() {
            return Err(ValidationError::Missing("paypal.client_secret"));
        }
        self.parsed_environment()?;
        Ok(())
    }
}

fn default_environment() -> String {
    "sandbox".to_string()
}
