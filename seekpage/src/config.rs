//! Paginator settings loadable from TOML.
//!
//! ```toml
//! sort_fields = "p.created_at, p.id"
//! direction = "asc"
//! primary_keys = "id"
//! limit = 25
//! max_limit = 500
//! tuple_comparison = "expanded"
//! ```

use serde::{Deserialize, Serialize};

use crate::builder::SortDir;
use crate::error::PaginateError;
use crate::pagination::TupleComparison;
use crate::validate::parse_field_list;

/// Default page size.
pub const DEFAULT_LIMIT: u64 = 20;

/// Default upper bound on the page size.
pub const DEFAULT_MAX_LIMIT: u64 = 1000;

/// Paginator settings. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginatorConfig {
    /// Comma separated sort fields, optionally alias-qualified.
    pub sort_fields: String,
    /// Configured sort direction.
    pub direction: SortDir,
    /// Comma separated primary-key fields for the deferred-join subquery.
    pub primary_keys: String,
    /// Page size.
    pub limit: u64,
    /// Largest page size a request may ask for.
    pub max_limit: u64,
    /// How multi-field keyset conditions are rendered.
    pub tuple_comparison: TupleComparison,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            sort_fields: "created_at".to_string(),
            direction: SortDir::default(),
            primary_keys: "id".to_string(),
            limit: DEFAULT_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
            tuple_comparison: TupleComparison::default(),
        }
    }
}

impl PaginatorConfig {
    /// Parse settings from a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, PaginateError> {
        let config: Self = toml::from_str(s)
            .map_err(|e| PaginateError::InvalidRequest(format!("invalid paginator config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check limits and field lists.
    pub fn validate(&self) -> Result<(), PaginateError> {
        check_limit(self.limit, Some(self.max_limit))?;
        parse_field_list(&self.sort_fields, "sort field")?;
        parse_field_list(&self.primary_keys, "primary key")?;
        Ok(())
    }
}

pub(crate) fn check_limit(limit: u64, max_limit: Option<u64>) -> Result<(), PaginateError> {
    if limit == 0 {
        return Err(PaginateError::InvalidRequest(
            "limit must be greater than zero".into(),
        ));
    }
    if let Some(max) = max_limit
        && limit > max
    {
        return Err(PaginateError::InvalidRequest(format!(
            "limit {limit} exceeds maximum {max}"
        )));
    }
    Ok(())
}
