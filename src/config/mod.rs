//! Typed, env-driven configuration.
//!
//! Values come from the process environment (and a `.env` file in
//! development) under the `PAYPAL_RELAY` prefix, with `__` separating
//! nested sections: `PAYPAL_RELAY__PAYPAL__CLIENT_ID` lands in
//! `paypal.client_id`. Each section checks its own invariants after
//! loading.

mod database;
mod error;
mod paypal;
mod redis;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use paypal::PaypalConfig;
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Everything the binary needs to come up.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub paypal: PaypalConfig,
}

impl AppConfig {
    /// Read configuration from the environment.
    ///
    /// Fails when a required value is absent or a value cannot be parsed
    /// into its field's type.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let loaded = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PAYPAL_RELAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(loaded)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.redis.validate()?;
        self.paypal.validate()
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
