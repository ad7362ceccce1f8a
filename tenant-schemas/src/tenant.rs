//! Tenant Records
//!
//! A tenant owns exactly one PostgreSQL schema and is reached through one
//! domain.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tenant information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tenant {
    /// Schema holding this tenant's tables (unique, lowercase)
    pub schema_name: String,

    /// Domain the tenant is served on
    pub domain_url: String,

    /// Additional metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl Tenant {
    /// Create a new tenant
    ///
    /// # Examples
    ///
    /// ```
    /// use tenant_schemas::Tenant;
    ///
    /// let tenant = Tenant::new("demo1", "demo1.example.com");
    /// assert_eq!(tenant.schema_name, "demo1");
    /// ```
    pub fn new(schema_name: impl Into<String>, domain_url: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            domain_url: domain_url.into(),
            metadata: HashMap::new(),
        }
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Whether this record describes the shared public schema.
    pub fn is_public(&self, public_schema_name: &str) -> bool {
        self.schema_name == public_schema_name
    }
}
