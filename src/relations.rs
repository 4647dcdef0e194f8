//! Relation inclusion requests and the allow-list guarding them.
//!
//! A request names relations as dot-paths (`comments.author`). Paths are
//! validated here against the resource's registered allow-list and the
//! configured nesting depth; loading happens in each resource's
//! [`crate::traits::CrudResource::load_relations`] override, which is the
//! only place that knows the related entity types.

use crate::config::CrudConfig;
use crate::errors::CrudError;
use crate::filtering::SortDirective;
use crate::models::IncludeSpec;
use crate::traits::CrudResource;

/// One validated relation to attach, with its optional per-relation
/// constraints from the search body. `filters` stays raw JSON because only
/// the related resource knows its own filterable columns.
#[derive(Debug, Clone)]
pub struct RelationRequest {
    pub path: String,
    pub filters: Option<serde_json::Value>,
    pub sorts: Vec<SortDirective>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl RelationRequest {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            filters: None,
            sorts: Vec::new(),
            page: None,
            limit: None,
        }
    }

    /// First path segment, the relation on the root resource.
    #[must_use]
    pub fn root(&self) -> &str {
        self.path.split('.').next().unwrap_or(&self.path)
    }

    #[must_use]
    pub fn is_for(&self, relation: &str) -> bool {
        self.root() == relation
    }
}

impl From<&IncludeSpec> for RelationRequest {
    fn from(spec: &IncludeSpec) -> Self {
        Self {
            path: spec.relation.clone(),
            filters: spec.filters.clone(),
            sorts: spec.sort.clone().unwrap_or_default(),
            page: spec.page,
            limit: spec.limit,
        }
    }
}

/// Resolve the relations a request asks for, from the flat `include`
/// parameter and/or the structured body form. Paths are validated against
/// the resource's allow-list; on a duplicate path the body entry wins since
/// it can carry constraints the flat form cannot.
pub fn requested_relations<R: CrudResource>(
    include: Option<&str>,
    includes: Option<&[IncludeSpec]>,
    config: &CrudConfig,
) -> Result<Vec<RelationRequest>, CrudError> {
    let allowed = R::allowed_relations();
    let mut requests: Vec<RelationRequest> = Vec::new();

    if let Some(raw) = include {
        for path in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            validate_path(path, &allowed, config.max_nested_depth)?;
            upsert(&mut requests, RelationRequest::new(path));
        }
    }
    if let Some(specs) = includes {
        for spec in specs {
            validate_path(&spec.relation, &allowed, config.max_nested_depth)?;
            upsert(&mut requests, RelationRequest::from(spec));
        }
    }
    Ok(requests)
}

fn upsert(requests: &mut Vec<RelationRequest>, request: RelationRequest) {
    if let Some(existing) = requests.iter_mut().find(|r| r.path == request.path) {
        *existing = request;
    } else {
        requests.push(request);
    }
}

fn validate_path(path: &str, allowed: &[&str], max_depth: usize) -> Result<(), CrudError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(CrudError::relation_not_allowed(path));
    }
    let depth = segments.len() - 1;
    if depth > max_depth {
        return Err(CrudError::nesting_limit(depth, max_depth));
    }
    if allowed.iter().any(|entry| matches_entry(entry, path)) {
        Ok(())
    } else {
        Err(CrudError::relation_not_allowed(path))
    }
}

/// `comments` matches exactly; `comments.*` matches any strictly deeper
/// path under `comments`.
fn matches_entry(entry: &str, path: &str) -> bool {
    if let Some(prefix) = entry.strip_suffix(".*") {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'))
    } else {
        entry == path
    }
}

/// Apply each entity's relation guard across a whole collection, whichever
/// operation produced it.
pub fn guard_relations_for_collection<R: CrudResource>(
    resources: &mut [R],
    requests: &[RelationRequest],
) {
    for resource in resources {
        resource.guard_relations(requests);
    }
}
