//! PostgreSQL implementation of SiteRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

use crate::domain::foundation::SiteId;
use crate::domain::site::{NewTenantSite, SiteStatus, TenantSite};
use crate::ports::{SiteRepository, SiteRepositoryError};

pub struct PostgresSiteRepository {
    pool: PgPool,
}

impl PostgresSiteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a tenant site.
#[derive(Debug, sqlx::FromRow)]
struct SiteRow {
    id: i64,
    url: String,
    name: String,
    api_key: String,
    api_secret: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SiteRow> for TenantSite {
    type Error = SiteRepositoryError;

    fn try_from(row: SiteRow) -> Result<Self, Self::Error> {
        let status = parse_status(&row.status)?;
        Ok(TenantSite {
            id: SiteId::new(row.id),
            url: row.url,
            name: row.name,
            api_key: row.api_key,
            api_secret: SecretString::new(row.api_secret),
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn parse_status(s: &str) -> Result<SiteStatus, SiteRepositoryError> {
    SiteStatus::parse(s)
        .ok_or_else(|| SiteRepositoryError::Storage(format!("invalid site status value: {}", s)))
}

fn map_unique_violation(e: sqlx::Error, context: &str) -> SiteRepositoryError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.constraint() == Some("sites_api_key_key") {
            return SiteRepositoryError::DuplicateApiKey;
        }
    }
    SiteRepositoryError::Storage(format!("{}: {}", context, e))
}

const SITE_COLUMNS: &str =
    "id, url, name, api_key, api_secret, status, created_at, updated_at";

#[async_trait]
impl SiteRepository for PostgresSiteRepository {
    async fn find_by_api_key(
        &self,
        api_key: &str,
    ) -> Result<Option<TenantSite>, SiteRepositoryError> {
        let row: Option<SiteRow> = sqlx::query_as(&format!(
            "SELECT {} FROM sites WHERE api_key = $1 AND status = 'active'",
            SITE_COLUMNS
        ))
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SiteRepositoryError::Storage(format!("failed to find site: {}", e)))?;

        row.map(TenantSite::try_from).transpose()
    }

    async fn find_by_id(&self, id: SiteId) -> Result<Option<TenantSite>, SiteRepositoryError> {
        let row: Option<SiteRow> = sqlx::query_as(&format!(
            "SELECT {} FROM sites WHERE id = $1",
            SITE_COLUMNS
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SiteRepositoryError::Storage(format!("failed to find site: {}", e)))?;

        row.map(TenantSite::try_from).transpose()
    }

    async fn create(&self, site: NewTenantSite) -> Result<TenantSite, SiteRepositoryError> {
        let row: SiteRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO sites (url, name, api_key, api_secret, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            SITE_COLUMNS
        ))
        .bind(&site.url)
        .bind(&site.name)
        .bind(&site.api_key)
        .bind(site.api_secret.expose_secret())
        .bind(site.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "failed to create site"))?;

        TenantSite::try_from(row)
    }

    async fn update(&self, site: &TenantSite) -> Result<(), SiteRepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE sites SET
                url = $2,
                name = $3,
                api_key = $4,
                api_secret = $5,
                status = $6,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(site.id.as_i64())
        .bind(&site.url)
        .bind(&site.name)
        .bind(&site.api_key)
        .bind(site.api_secret.expose_secret())
        .bind(site.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "failed to update site"))?;

        if result.rows_affected() == 0 {
            return Err(SiteRepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: SiteId) -> Result<(), SiteRepositoryError> {
        let result = sqlx::query("DELETE FROM sites WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| SiteRepositoryError::Storage(format!("failed to delete site: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(SiteRepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<TenantSite>, SiteRepositoryError> {
        let rows: Vec<SiteRow> = sqlx::query_as(&format!(
            "SELECT {} FROM sites ORDER BY id",
            SITE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| SiteRepositoryError::Storage(format!("failed to list sites: {}", e)))?;

        rows.into_iter().map(TenantSite::try_from).collect()
    }
}
