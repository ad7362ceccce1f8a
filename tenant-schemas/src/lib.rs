//! Schema-per-tenant multi-tenancy
//!
//! Each tenant's tables live in a PostgreSQL schema of their own, next to
//! a shared `public` schema visible to every tenant. Which application owns
//! which tables is declared in settings: `TENANT_APPS` go into every tenant
//! schema, `SHARED_APPS` into public.
//!
//! A wrong declaration leaks data across tenants silently, so this crate
//! ships a configuration audit the host runs at startup.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use tenant_schemas::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let settings = TenancySettings::default()
//!     .with_shared_apps(["tenant_schemas", "customers"])
//!     .with_tenant_apps(["dts_test_app"])
//!     .with_installed_apps(["tenant_schemas", "customers", "dts_test_app"])
//!     .with_tenant_model("customers.Client")
//!     .with_database_routers(["tenant_schemas.routers.TenantSyncRouter"]);
//!
//! let store = Arc::new(InMemoryTenantStore::new());
//! store.create(Tenant::new("demo1", "demo1.example.com")).unwrap();
//!
//! let registry = AppRegistry::from_installed_apps(&settings.installed_apps).unwrap();
//! let findings = Auditor::new(store).audit(&registry, &settings).await.unwrap();
//! assert!(findings.is_empty());
//! # });
//! ```
//!
//! # Loading Settings
//!
//! ```rust,ignore
//! use tenant_schemas_config::ConfigService;
//!
//! let config = ConfigService::builder()
//!     .add_auto_file("settings.toml")
//!     .with_prefix("MYSITE")
//!     .load_env()
//!     .build()?;
//! let settings = TenancySettings::from_config(config.manager())?;
//! ```

pub mod checks;
pub mod registry;
pub mod schema;
pub mod settings;
pub mod store;
pub mod tenant;

pub use checks::{
    AuditOptions, Auditor, Finding, Hint, Severity, audit, audit_with, ensure_no_critical,
    ordered_difference, ordered_intersection,
};
pub use registry::{AppConfig, AppRegistry};
pub use schema::{DEFAULT_PUBLIC_SCHEMA, SearchPath, is_valid_schema_name};
pub use settings::TenancySettings;
pub use store::{InMemoryTenantStore, TenantError, TenantStore};
pub use tenant::Tenant;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::checks::{AuditOptions, Auditor, Finding, Hint, Severity, audit};
    pub use crate::registry::{AppConfig, AppRegistry};
    pub use crate::settings::TenancySettings;
    pub use crate::store::{InMemoryTenantStore, TenantError, TenantStore};
    pub use crate::tenant::Tenant;
}
