//! Startup configuration surface.
//!
//! Resolved once when a resource is registered into a
//! [`CrudContext`](crate::operations::CrudContext); nothing here is consulted
//! dynamically per call beyond plain field reads.

use serde::Deserialize;

/// Maximum depth of nested filter groups and relation paths.
const DEFAULT_MAX_NESTED_DEPTH: usize = 1;

/// Page size applied when the request carries no explicit limit.
const DEFAULT_PAGE_LIMIT: u64 = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrudConfig {
    pub max_nested_depth: usize,
    pub pagination: PaginationConfig,
    pub search: SearchConfig,
}

impl Default for CrudConfig {
    fn default() -> Self {
        Self {
            max_nested_depth: DEFAULT_MAX_NESTED_DEPTH,
            pagination: PaginationConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Items per page when the request does not specify one.
    pub default_limit: u64,
    /// When true every collection call returns the unbounded result set as a
    /// single page and the response carries no pagination meta.
    pub disabled: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            disabled: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Switches the search match operator between plain `LIKE` and an
    /// upper-cased comparison on both sides.
    pub case_sensitive: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            case_sensitive: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = CrudConfig::default();
        assert_eq!(config.max_nested_depth, 1);
        assert_eq!(config.pagination.default_limit, 10);
        assert!(!config.pagination.disabled);
        assert!(config.search.case_sensitive);
    }

    #[test]
    fn deserializes_partial_config() {
        let config: CrudConfig =
            serde_json::from_str(r#"{"max_nested_depth": 3, "pagination": {"default_limit": 25}}"#)
                .unwrap();
        assert_eq!(config.max_nested_depth, 3);
        assert_eq!(config.pagination.default_limit, 25);
        assert!(!config.pagination.disabled);
        assert!(config.search.case_sensitive);
    }
}
