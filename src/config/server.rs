//! HTTP listener settings.

use serde::Deserialize;
use std::net::SocketAddr;

use super::error::ValidationError;

/// Deployment stage, reported in startup logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

/// Where and how the proxy listens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    /// Tracing filter used when RUST_LOG is not set.
    pub log_level: String,
    /// Applied to every inbound request by the timeout layer.
    pub request_timeout_secs: u64,
    /// Comma-separated origin allowlist; unset means permissive CORS.
    pub cors_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: Environment::Development,
            log_level: "info,paypal_relay=debug,sqlx=warn".to_string(),
            request_timeout_secs: 30,
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        let candidate = format!("{}:{}", self.host, self.port);
        candidate
            .parse()
            .map_err(|_| ValidationError::BadBindAddress(candidate))
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// The configured CORS origins, trimmed, with empty entries dropped.
    pub fn cors_origins_list(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .into_iter()
            .flat_map(|raw| raw.split(','))
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::BadBindAddress(format!(
                "{}:{}",
                self.host, self.port
            )));
        }
        self.socket_addr()?;
        if !(1..=300).contains(&self.request_timeout_secs) {
            return Err(ValidationError::BadTimeout(self.request_timeout_secs));
        }
        Ok(())
    }
}
