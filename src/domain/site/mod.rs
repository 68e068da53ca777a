//! Tenant site model: the registered storefronts allowed to use the proxy.

mod model;

pub use model::{NewTenantSite, SiteCredentials, SiteStatus, TenantSite};
