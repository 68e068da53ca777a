//! Redis settings for the pending order context store.

use serde::Deserialize;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Connection URL. Context entries expire server-side, so there is no
    /// further tuning here.
    pub url: String,
}

impl RedisConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::Missing("redis.url"));
        }
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err(ValidationError::BadRedisUrl);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_tls_urls_pass() {
        for url in ["redis://localhost:6379", "rediss://cache.example.com:6380"] {
            let config = RedisConfig {
                url: url.to_string(),
            };
            assert!(config.validate().is_ok(), "url: {url}");
        }
    }

    #[test]
    fn other_schemes_and_empty_urls_are_rejected() {
        let config = RedisConfig {
            url: "memcached://localhost".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::BadRedisUrl)
        ));

        let config = RedisConfig { url: String::new() };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::Missing(_))
        ));
    }
}
