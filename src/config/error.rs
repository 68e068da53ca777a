//! Configuration loading and validation failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration could not be loaded: {0}")]
    Load(#[from] config::ConfigError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// A configuration value that loaded but cannot be used.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("'{0}' is not a usable bind address")]
    BadBindAddress(String),

    #[error("request timeout must be between 1 and 300 seconds, got {0}")]
    BadTimeout(u64),

    #[error("database URL must use the postgres:// or postgresql:// scheme")]
    BadDatabaseUrl,

    #[error("redis URL must use the redis:// or rediss:// scheme")]
    BadRedisUrl,

    #[error("pool min_connections ({min}) exceeds max_connections ({max})")]
    PoolBounds { min: u32, max: u32 },

    #[error("PayPal environment must be \"sandbox\" or \"live\", got \"{0}\"")]
    BadPaypalEnvironment(String),
}
