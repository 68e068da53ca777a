//! Credential store port: read access for the protocol core, CRUD for admin
//! tooling.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{ProxyError, SiteId};
use crate::domain::site::{NewTenantSite, TenantSite};

#[derive(Debug, Clone, Error)]
pub enum SiteRepositoryError {
    /// Another site already holds this api_key. Keys are globally unique.
    #[error("API key is already registered to another site")]
    DuplicateApiKey,

    #[error("site not found")]
    NotFound,

    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<SiteRepositoryError> for ProxyError {
    fn from(err: SiteRepositoryError) -> Self {
        match err {
            SiteRepositoryError::NotFound => ProxyError::not_found("site"),
            SiteRepositoryError::DuplicateApiKey => {
                ProxyError::validation("API key is already registered")
            }
            SiteRepositoryError::Storage(msg) => ProxyError::storage(msg),
        }
    }
}

/// Lookup and lifecycle operations over tenant site records.
///
/// The protocol core only ever reads; `create`/`update`/`delete`/`list`
/// exist for the administrative collaborator.
#[async_trait]
pub trait SiteRepository: Send + Sync {
    /// Find the **active** site holding this api_key. Inactive sites are
    /// invisible to the protocol.
    async fn find_by_api_key(
        &self,
        api_key: &str,
    ) -> Result<Option<TenantSite>, SiteRepositoryError>;

    async fn find_by_id(&self, id: SiteId) -> Result<Option<TenantSite>, SiteRepositoryError>;

    async fn create(&self, site: NewTenantSite) -> Result<TenantSite, SiteRepositoryError>;

    async fn update(&self, site: &TenantSite) -> Result<(), SiteRepositoryError>;

    async fn delete(&self, id: SiteId) -> Result<(), SiteRepositoryError>;

    async fn list(&self) -> Result<Vec<TenantSite>, SiteRepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn SiteRepository) {}
    }

    #[test]
    fn storage_errors_map_to_internal() {
        let err: ProxyError = SiteRepositoryError::Storage("pool gone".into()).into();
        assert_eq!(err.public_message(), "internal error");
    }
}
