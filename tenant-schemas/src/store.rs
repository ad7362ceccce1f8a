//! Tenant Storage
//!
//! Read access to the tenant model's rows. Hosts implement [`TenantStore`]
//! over their own database; [`InMemoryTenantStore`] backs tests and
//! single-process setups.

use crate::schema::{DEFAULT_PUBLIC_SCHEMA, is_valid_schema_name};
use crate::tenant::Tenant;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tenant_schemas_config::ConfigError;
use tenant_schemas_log::debug;

/// Tenancy errors
#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    #[error("Tenant not found: {0}")]
    NotFound(String),

    #[error("Invalid tenant configuration: {0}")]
    Invalid(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Configuration has {0} critical finding(s)")]
    CriticalFindings(usize),
}

/// Tenant store trait (implement with your database)
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Schema names of every tenant row.
    async fn schema_names(&self) -> Result<Vec<String>, TenantError>;

    /// Find tenant by schema name
    async fn find_by_schema(&self, schema_name: &str) -> Result<Option<Tenant>, TenantError>;

    /// Find tenant by domain
    async fn find_by_domain(&self, domain_url: &str) -> Result<Option<Tenant>, TenantError>;
}

/// In-memory tenant store, keyed by schema name
#[derive(Debug)]
pub struct InMemoryTenantStore {
    tenants: parking_lot::RwLock<BTreeMap<String, Tenant>>,
    public_schema: String,
}

impl Default for InMemoryTenantStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTenantStore {
    pub fn new() -> Self {
        Self::with_public_schema(DEFAULT_PUBLIC_SCHEMA)
    }

    /// Create a store that reserves a custom public schema name.
    pub fn with_public_schema(public_schema: impl Into<String>) -> Self {
        Self {
            tenants: parking_lot::RwLock::new(BTreeMap::new()),
            public_schema: public_schema.into(),
        }
    }

    /// Insert a tenant.
    ///
    /// Rejects invalid schema names, the public schema, and duplicate
    /// schema names or domains.
    pub fn create(&self, tenant: Tenant) -> Result<(), TenantError> {
        if !is_valid_schema_name(&tenant.schema_name) {
            return Err(TenantError::Invalid(format!(
                "Invalid schema name: {}",
                tenant.schema_name
            )));
        }
        if tenant.is_public(&self.public_schema) {
            return Err(TenantError::Invalid(format!(
                "Schema {} is reserved for shared tables",
                tenant.schema_name
            )));
        }

        let mut tenants = self.tenants.write();
        if tenants.contains_key(&tenant.schema_name) {
            return Err(TenantError::Invalid(format!(
                "Tenant with schema {} already exists",
                tenant.schema_name
            )));
        }
        if tenants.values().any(|t| t.domain_url == tenant.domain_url) {
            return Err(TenantError::Invalid(format!(
                "Domain {} is already in use",
                tenant.domain_url
            )));
        }

        debug!("Created tenant {} ({})", tenant.schema_name, tenant.domain_url);
        tenants.insert(tenant.schema_name.clone(), tenant);
        Ok(())
    }

    /// Remove a tenant by schema name.
    pub fn delete(&self, schema_name: &str) -> Result<Tenant, TenantError> {
        self.tenants
            .write()
            .remove(schema_name)
            .ok_or_else(|| TenantError::NotFound(schema_name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.tenants.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.read().is_empty()
    }
}

#[async_trait]
impl TenantStore for InMemoryTenantStore {
    async fn schema_names(&self) -> Result<Vec<String>, TenantError> {
        Ok(self.tenants.read().keys().cloned().collect())
    }

    async fn find_by_schema(&self, schema_name: &str) -> Result<Option<Tenant>, TenantError> {
        Ok(self.tenants.read().get(schema_name).cloned())
    }

    async fn find_by_domain(&self, domain_url: &str) -> Result<Option<Tenant>, TenantError> {
        Ok(self
            .tenants
            .read()
            .values()
            .find(|t| t.domain_url == domain_url)
            .cloned())
    }
}
