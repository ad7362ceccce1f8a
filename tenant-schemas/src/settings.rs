//! Tenancy Settings
//!
//! Immutable snapshot of the settings the tenancy layer reads. Unset and
//! empty are kept apart: `None` means the setting was never configured.
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = ConfigService::builder()
//!     .add_auto_file("settings.toml")
//!     .load_env()
//!     .build()?;
//!
//! let settings = TenancySettings::from_config(config.manager())?;
//! ```

use crate::schema::DEFAULT_PUBLIC_SCHEMA;
use serde::{Deserialize, Serialize};
use tenant_schemas_config::{ConfigManager, ConfigValidator, Result, Validate};

pub const TENANT_APPS: &str = "TENANT_APPS";
pub const SHARED_APPS: &str = "SHARED_APPS";
pub const INSTALLED_APPS: &str = "INSTALLED_APPS";
pub const TENANT_MODEL: &str = "TENANT_MODEL";
pub const DATABASE_ROUTERS: &str = "DATABASE_ROUTERS";
pub const PG_EXTRA_SEARCH_PATHS: &str = "PG_EXTRA_SEARCH_PATHS";
pub const PUBLIC_SCHEMA_NAME: &str = "PUBLIC_SCHEMA_NAME";

/// Settings consumed by the tenancy layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenancySettings {
    /// Apps whose tables live in every tenant schema
    pub tenant_apps: Option<Vec<String>>,

    /// Apps whose tables live in the public schema
    pub shared_apps: Option<Vec<String>>,

    /// Every app the host registers
    pub installed_apps: Vec<String>,

    /// Dotted reference to the tenant model
    pub tenant_model: Option<String>,

    /// Database router references, in order
    pub database_routers: Vec<String>,

    /// Schemas appended to every connection's search path
    pub pg_extra_search_paths: Vec<String>,

    /// Name of the shared schema
    pub public_schema_name: String,
}

impl Default for TenancySettings {
    fn default() -> Self {
        Self {
            tenant_apps: None,
            shared_apps: None,
            installed_apps: Vec::new(),
            tenant_model: None,
            database_routers: Vec::new(),
            pg_extra_search_paths: Vec::new(),
            public_schema_name: DEFAULT_PUBLIC_SCHEMA.to_string(),
        }
    }
}

impl TenancySettings {
    /// Read and validate the tenancy settings from a settings bag.
    ///
    /// Missing settings become `None` or their defaults; a setting with the
    /// wrong shape is an error.
    pub fn from_config(config: &ConfigManager) -> Result<Self> {
        let settings = Self {
            tenant_apps: config.get_list(TENANT_APPS)?,
            shared_apps: config.get_list(SHARED_APPS)?,
            installed_apps: config.get_list(INSTALLED_APPS)?.unwrap_or_default(),
            tenant_model: config.get_optional(TENANT_MODEL)?,
            database_routers: config.get_list(DATABASE_ROUTERS)?.unwrap_or_default(),
            pg_extra_search_paths: config.get_list(PG_EXTRA_SEARCH_PATHS)?.unwrap_or_default(),
            public_schema_name: config
                .get_optional(PUBLIC_SCHEMA_NAME)?
                .unwrap_or_else(|| DEFAULT_PUBLIC_SCHEMA.to_string()),
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn with_tenant_apps<I, S>(mut self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tenant_apps = Some(apps.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_shared_apps<I, S>(mut self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shared_apps = Some(apps.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_installed_apps<I, S>(mut self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.installed_apps = apps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tenant_model(mut self, model: impl Into<String>) -> Self {
        self.tenant_model = Some(model.into());
        self
    }

    pub fn with_database_routers<I, S>(mut self, routers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.database_routers = routers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pg_extra_search_paths<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pg_extra_search_paths = schemas.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_public_schema_name(mut self, name: impl Into<String>) -> Self {
        self.public_schema_name = name.into();
        self
    }
}

impl Validate for TenancySettings {
    fn validate(&self) -> Result<()> {
        ConfigValidator::not_empty(&self.public_schema_name, PUBLIC_SCHEMA_NAME)?;
        if let Some(model) = &self.tenant_model {
            ConfigValidator::dotted_path(model, TENANT_MODEL)?;
        }
        Ok(())
    }
}
