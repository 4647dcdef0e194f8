//! Request parameter and batch payload types.
//!
//! These are the raw deserialization targets; the filtering and relations
//! modules turn them into validated values ([`crate::filtering::FilterNode`],
//! [`crate::relations::RelationRequest`]) before anything touches a query.

use serde::Deserialize;
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::filtering::sort::SortDirective;

/// Query parameters accepted by collection and batch endpoints.
///
/// # Filtering
/// The `filter` parameter is a JSON-encoded array of filter nodes. A leaf
/// node is `{"field": ..., "operator": ..., "value": ..., "combinator": ...}`
/// and a group node is `{"nested": [...], "combinator": ...}`:
/// ```json
/// [
///   {"field": "published", "operator": "eq", "value": true},
///   {"nested": [
///     {"field": "views", "operator": "gte", "value": 100},
///     {"field": "title", "operator": "like", "value": "%rust%", "combinator": "or"}
///   ]}
/// ]
/// ```
///
/// # Search
/// `q` matches a single term across the resource's searchable fields with OR
/// semantics.
///
/// # Relations
/// `include` is a comma-separated list of dot-paths, for example
/// `include=tags,comments.author`.
///
/// # Sorting and pagination
/// `sort=views:desc,title` / `page=2&limit=15`. A `limit` of `0` disables
/// pagination for the call.
#[derive(Debug, Deserialize, IntoParams, ToSchema, Default)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// JSON-encoded array of filter nodes.
    #[param(example = r#"[{"field": "published", "operator": "eq", "value": true}]"#)]
    pub filter: Option<String>,
    /// Free-text search term matched across searchable fields.
    #[param(example = "rust")]
    pub q: Option<String>,
    /// Comma-separated relation dot-paths to eager-load.
    #[param(example = "tags,comments.author")]
    pub include: Option<String>,
    /// Comma-separated sort directives in `field:direction` form.
    #[param(example = "views:desc,title")]
    pub sort: Option<String>,
    /// Page number, 1-based.
    #[param(example = 2)]
    pub page: Option<u64>,
    /// Items per page; `0` returns the unbounded result set as one page.
    #[param(example = 15)]
    pub limit: Option<u64>,
    /// Include soft-deleted entities in the result set.
    pub with_trashed: Option<bool>,
    /// Return only soft-deleted entities.
    pub only_trashed: Option<bool>,
    /// On destroy: bypass soft delete and remove the row permanently.
    pub force: Option<bool>,
}

/// Body of the `search` endpoint: the structured superset of [`ListParams`].
///
/// `filters` carries the filter tree as native JSON; `includes` allows
/// per-relation filters, sorting, and pagination that the flat `include`
/// query parameter cannot express.
#[derive(Debug, Deserialize, ToSchema, Default)]
pub struct SearchBody {
    pub filters: Option<serde_json::Value>,
    pub search: Option<SearchTerm>,
    pub sort: Option<Vec<SortDirective>>,
    pub includes: Option<Vec<IncludeSpec>>,
}

/// Free-text search request; `case_sensitive` overrides the configured
/// default for this call only.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchTerm {
    pub value: String,
    pub case_sensitive: Option<bool>,
}

/// One entry of [`SearchBody::includes`].
#[derive(Debug, Deserialize, ToSchema)]
pub struct IncludeSpec {
    pub relation: String,
    pub filters: Option<serde_json::Value>,
    pub sort: Option<Vec<SortDirective>>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Batch create payload: one create model per new entity, in order.
#[derive(Debug, Deserialize)]
#[serde(bound = "C: serde::de::DeserializeOwned")]
pub struct BatchStore<C> {
    pub resources: Vec<C>,
}

/// Batch update payload: partial update models keyed by resource key.
/// `BTreeMap` keeps the mutation order deterministic.
#[derive(Debug, Deserialize)]
#[serde(bound = "U: serde::de::DeserializeOwned")]
pub struct BatchUpdate<U> {
    pub resources: BTreeMap<Uuid, U>,
}

/// Batch destroy/restore payload: the keys of the affected entities.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchKeys {
    pub resources: Vec<Uuid>,
}
