//! In-memory SiteRepository.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::foundation::SiteId;
use crate::domain::site::{NewTenantSite, SiteStatus, TenantSite};
use crate::ports::{SiteRepository, SiteRepositoryError};

pub struct InMemorySiteRepository {
    sites: Mutex<Vec<TenantSite>>,
    next_id: AtomicI64,
}

impl InMemorySiteRepository {
    pub fn new() -> Self {
        Self {
            sites: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Seed a repository with pre-built sites (tests).
    pub fn with_sites(sites: Vec<TenantSite>) -> Self {
        let max_id = sites.iter().map(|s| s.id.as_i64()).max().unwrap_or(0);
        Self {
            sites: Mutex::new(sites),
            next_id: AtomicI64::new(max_id + 1),
        }
    }
}

#[async_trait]
impl SiteRepository for InMemorySiteRepository {
    async fn find_by_api_key(
        &self,
        api_key: &str,
    ) -> Result<Option<TenantSite>, SiteRepositoryError> {
        let sites = self.sites.lock().expect("site store lock");
        Ok(sites
            .iter()
            .find(|s| s.api_key == api_key && s.status == SiteStatus::Active)
            .cloned())
    }

    async fn find_by_id(&self, id: SiteId) -> Result<Option<TenantSite>, SiteRepositoryError> {
        let sites = self.sites.lock().expect("site store lock");
        Ok(sites.iter().find(|s| s.id == id).cloned())
    }

    async fn create(&self, site: NewTenantSite) -> Result<TenantSite, SiteRepositoryError> {
        let mut sites = self.sites.lock().expect("site store lock");
        if sites.iter().any(|s| s.api_key == site.api_key) {
            return Err(SiteRepositoryError::DuplicateApiKey);
        }

        let now = Utc::now();
        let created = TenantSite {
            id: SiteId::new(self.next_id.fetch_add(1, Ordering::SeqCst)),
            url: site.url,
            name: site.name,
            api_key: site.api_key,
            api_secret: site.api_secret,
            status: site.status,
            created_at: now,
            updated_at: now,
        };
        sites.push(created.clone());
        Ok(created)
    }

    async fn update(&self, site: &TenantSite) -> Result<(), SiteRepositoryError> {
        let mut sites = self.sites.lock().expect("site store lock");
        if sites
            .iter()
            .any(|s| s.api_key == site.api_key && s.id != site.id)
        {
            return Err(SiteRepositoryError::DuplicateApiKey);
        }
        let existing = sites
            .iter_mut()
            .find(|s| s.id == site.id)
            .ok_or(SiteRepositoryError::NotFound)?;
        *existing = TenantSite {
            updated_at: Utc::now(),
            ..site.clone()
        };
        Ok(())
    }

    async fn delete(&self, id: SiteId) -> Result<(), SiteRepositoryError> {
        let mut sites = self.sites.lock().expect("site store lock");
        let before = sites.len();
        sites.retain(|s| s.id != id);
        if sites.len() == before {
            return Err(SiteRepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<TenantSite>, SiteRepositoryError> {
        Ok(self.sites.lock().expect("site store lock").clone())
    }
}
