use uuid::Uuid;

use crate::config::CrudConfig;
use crate::errors::CrudError;
use crate::filtering::{
    FilterNode, SearchSpec, SortDirective, parse_filter, parse_filter_param, parse_sort_param,
    validate_sorts,
};
use crate::models::{ListParams, SearchBody};
use crate::traits::CrudResource;

/// Which soft-delete population a query addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrashedScope {
    /// Only live rows (`deleted_at IS NULL`).
    #[default]
    Live,
    /// Live and soft-deleted rows.
    WithTrashed,
    /// Soft-deleted rows only.
    OnlyTrashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// Single unbounded page, no meta/links in the response.
    Disabled,
    Page { page: u64, per_page: u64 },
}

/// Fully validated description of a collection query.
///
/// Built once per request from the wire input and never mutated afterwards;
/// each `with_*` constructor returns a new value. The compiler in
/// [`super::compile`] is the only consumer.
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    filter: Option<FilterNode>,
    search: Option<SearchSpec>,
    sorts: Vec<SortDirective>,
    key_scope: Option<Vec<Uuid>>,
    trashed: TrashedScope,
    pagination: Option<Pagination>,
}

impl QuerySpec {
    /// Build a spec from list-endpoint query parameters.
    pub fn from_params<R: CrudResource>(
        params: &ListParams,
        config: &CrudConfig,
    ) -> Result<Self, CrudError> {
        let mut spec = Self::default()
            .with_trashed_scope(trashed_scope_from_params(params))
            .with_pagination(resolve_pagination(params.page, params.limit, config));
        if let Some(raw) = params.filter.as_deref() {
            spec = spec.with_filter(parse_filter_param::<R>(raw, config)?);
        }
        if let Some(term) = params.q.as_deref() {
            spec = spec.with_search(SearchSpec::from_query_param(term, &config.search));
        }
        if let Some(raw) = params.sort.as_deref() {
            spec = spec.with_sorts(parse_sort_param::<R>(raw)?);
        }
        Ok(spec)
    }

    /// Build a spec from the structured search body, with query parameters
    /// supplying scope and pagination. Body fields win where both exist.
    pub fn from_search_body<R: CrudResource>(
        body: &SearchBody,
        params: &ListParams,
        config: &CrudConfig,
    ) -> Result<Self, CrudError> {
        let mut spec = Self::from_params::<R>(params, config)?;
        if let Some(filters) = body.filters.as_ref() {
            spec = spec.with_filter(parse_filter::<R>(filters, config)?);
        }
        if let Some(term) = body.search.as_ref() {
            spec = spec.with_search(SearchSpec::from_body(term, &config.search));
        }
        if let Some(sorts) = body.sort.as_ref() {
            validate_sorts::<R>(sorts)?;
            spec = spec.with_sorts(sorts.clone());
        }
        Ok(spec)
    }

    #[must_use]
    pub fn with_filter(mut self, filter: FilterNode) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: SearchSpec) -> Self {
        self.search = Some(search);
        self
    }

    #[must_use]
    pub fn with_sorts(mut self, sorts: Vec<SortDirective>) -> Self {
        self.sorts = sorts;
        self
    }

    /// Restrict the query to a fixed key set, as batch fetches do.
    #[must_use]
    pub fn with_key_scope(mut self, keys: Vec<Uuid>) -> Self {
        self.key_scope = Some(keys);
        self
    }

    #[must_use]
    pub fn with_trashed_scope(mut self, scope: TrashedScope) -> Self {
        self.trashed = scope;
        self
    }

    #[must_use]
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    #[must_use]
    pub fn filter(&self) -> Option<&FilterNode> {
        self.filter.as_ref()
    }

    #[must_use]
    pub fn search(&self) -> Option<&SearchSpec> {
        self.search.as_ref()
    }

    #[must_use]
    pub fn sorts(&self) -> &[SortDirective] {
        &self.sorts
    }

    #[must_use]
    pub fn key_scope(&self) -> Option<&[Uuid]> {
        self.key_scope.as_deref()
    }

    #[must_use]
    pub fn trashed(&self) -> TrashedScope {
        self.trashed
    }

    /// `None` means the caller never resolved pagination (batch fetches).
    #[must_use]
    pub fn pagination(&self) -> Option<Pagination> {
        self.pagination
    }
}

/// Resolve the soft-delete scope from the request's trashed flags.
#[must_use]
pub fn trashed_scope_from_params(params: &ListParams) -> TrashedScope {
    if params.only_trashed.unwrap_or(false) {
        TrashedScope::OnlyTrashed
    } else if params.with_trashed.unwrap_or(false) {
        TrashedScope::WithTrashed
    } else {
        TrashedScope::Live
    }
}

/// Resolve the effective pagination for a request. `limit=0` opts out for
/// this call; otherwise the registered default applies when `limit` is
/// absent.
#[must_use]
pub fn resolve_pagination(page: Option<u64>, limit: Option<u64>, config: &CrudConfig) -> Pagination {
    if config.pagination.disabled || limit == Some(0) {
        return Pagination::Disabled;
    }
    Pagination::Page {
        page: page.unwrap_or(1).max(1),
        per_page: limit.unwrap_or(config.pagination.default_limit),
    }
}
