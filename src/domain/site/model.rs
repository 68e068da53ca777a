//! Tenant site records.
//!
//! A site is created and edited only through admin tooling; the protocol
//! core treats these records as read-only. Trust is anchored on the API key:
//! a signature is only ever checked against the secret of the site whose key
//! was presented.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

use crate::domain::foundation::SiteId;

/// Whether a site may currently use the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteStatus {
    Active,
    Inactive,
}

impl SiteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteStatus::Active => "active",
            SiteStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SiteStatus::Active),
            "inactive" => Some(SiteStatus::Inactive),
            _ => None,
        }
    }
}

/// A registered storefront.
#[derive(Debug, Clone)]
pub struct TenantSite {
    pub id: SiteId,
    pub url: String,
    pub name: String,
    /// Public identifier, globally unique across all tenants.
    pub api_key: String,
    /// Shared signing secret. Never serialized, never shown to other tenants.
    pub api_secret: SecretString,
    pub status: SiteStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantSite {
    pub fn is_active(&self) -> bool {
        self.status == SiteStatus::Active
    }

    /// The signing secret as bytes, for HMAC computation.
    pub fn secret_bytes(&self) -> &[u8] {
        self.api_secret.expose_secret().as_bytes()
    }
}

/// Fields needed to register a new site (admin tooling only).
#[derive(Debug, Clone)]
pub struct NewTenantSite {
    pub url: String,
    pub name: String,
    pub api_key: String,
    pub api_secret: SecretString,
    pub status: SiteStatus,
}

/// Freshly generated key/secret pair for a new site.
pub struct SiteCredentials {
    pub api_key: String,
    /// 64 hex chars of secret material.
    pub api_secret: SecretString,
}

impl SiteCredentials {
    /// Generate a random key (32 hex chars) and secret (64 hex chars).
    pub fn generate() -> Self {
        let api_key = uuid::Uuid::new_v4().simple().to_string();
        let api_secret = format!(
            "{}{}",
            uuid::Uuid::new_v4().simple(),
            uuid::Uuid::new_v4().simple()
        );
        Self {
            api_key,
            api_secret: SecretString::new(api_secret),
        }
    }
}
