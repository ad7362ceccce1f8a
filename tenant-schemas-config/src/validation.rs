// Settings validation

use crate::{ConfigError, Result};

/// Trait for validating a typed settings snapshot
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Reusable validation rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate that a value is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                field
            )));
        }
        Ok(())
    }

    /// Validate that a value is in a list of allowed values
    pub fn one_of<T: PartialEq>(value: &T, allowed: &[T], field: &str) -> Result<()> {
        if !allowed.contains(value) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be one of the allowed values",
                field
            )));
        }
        Ok(())
    }

    /// Validate a dotted reference such as `customers.Client` or
    /// `tenant_schemas.routers.TenantSyncRouter`.
    ///
    /// Every segment must be a non-empty identifier and at least two
    /// segments are required.
    pub fn dotted_path(value: &str, field: &str) -> Result<()> {
        let segments: Vec<&str> = value.split('.').collect();
        let valid_segment = |s: &&str| {
            let mut chars = s.chars();
            matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
                && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        };

        if segments.len() < 2 || !segments.iter().all(valid_segment) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be a dotted reference like 'app_label.ModelName', got '{}'",
                field, value
            )));
        }
        Ok(())
    }
}
