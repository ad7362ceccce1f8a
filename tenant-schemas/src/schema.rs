//! PostgreSQL Schema Names
//!
//! Schema name rules and search path composition for schema-per-tenant
//! isolation. Nothing here talks to a database; a connection layer applies
//! the resulting search path.
//!
//! # Usage
//!
//! ```
//! use tenant_schemas::SearchPath;
//!
//! let extra = vec!["extensions".to_string()];
//! let path = SearchPath::for_schema("demo1", "public", &extra);
//! assert_eq!(path.to_string(), "demo1, public, extensions");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Default name of the shared schema.
pub const DEFAULT_PUBLIC_SCHEMA: &str = "public";

// PostgreSQL identifiers are limited to 63 bytes.
static SCHEMA_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[_a-z][_a-z0-9]{0,62}$").expect("schema name pattern is valid")
});

/// Check whether `name` can be used as a tenant schema.
///
/// Names must be lowercase identifiers and must not use the `pg_` prefix,
/// which PostgreSQL reserves for system schemas.
///
/// # Examples
///
/// ```
/// use tenant_schemas::is_valid_schema_name;
///
/// assert!(is_valid_schema_name("demo1"));
/// assert!(!is_valid_schema_name("pg_catalog"));
/// assert!(!is_valid_schema_name("1demo"));
/// ```
pub fn is_valid_schema_name(name: &str) -> bool {
    SCHEMA_NAME.is_match(name) && !name.starts_with("pg_")
}

/// Ordered list of schemas a connection consults for unqualified names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath(Vec<String>);

impl SearchPath {
    /// Search path for `schema`.
    ///
    /// The public schema sees itself followed by the extra paths; a tenant
    /// schema sees itself, then public, then the extra paths.
    pub fn for_schema(schema: &str, public_schema: &str, extra: &[String]) -> Self {
        let mut schemas = Vec::with_capacity(extra.len() + 2);
        if schema != public_schema {
            schemas.push(schema.to_string());
        }
        schemas.push(public_schema.to_string());
        for name in extra {
            if !schemas.contains(name) {
                schemas.push(name.clone());
            }
        }
        Self(schemas)
    }

    pub fn schemas(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for SearchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}
