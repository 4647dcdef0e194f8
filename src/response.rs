//! Collection response envelope with Laravel-style pagination meta.

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::query::Pagination;

/// A collection payload plus its optional pagination block. `links` and
/// `meta` are omitted entirely when pagination is disabled for the call.
#[derive(Debug, Serialize, ToSchema)]
pub struct Envelope<R> {
    pub data: Vec<R>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Links {
    pub first: String,
    pub last: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Meta {
    pub current_page: u64,
    /// 1-based index of the first item on this page, absent when empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<u64>,
    pub last_page: u64,
    pub per_page: u64,
    /// 1-based index of the last item on this page, absent when empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<u64>,
    pub total: u64,
}

impl<R> Envelope<R> {
    /// Bare collection without pagination, as batch responses return.
    #[must_use]
    pub fn plain(data: Vec<R>) -> Self {
        Self {
            data,
            links: None,
            meta: None,
        }
    }

    /// Collection with meta and links derived from the page window.
    #[must_use]
    pub fn paginated(
        data: Vec<R>,
        page: u64,
        per_page: u64,
        total: u64,
        resource_plural: &str,
    ) -> Self {
        let per_page = per_page.max(1);
        let last_page = total.div_ceil(per_page).max(1);
        let count = data.len() as u64;
        let (from, to) = if count == 0 {
            (None, None)
        } else {
            let from = (page - 1) * per_page + 1;
            (Some(from), Some(from + count - 1))
        };

        let url = |p: u64| format!("/{resource_plural}?page={p}&limit={per_page}");
        let links = Links {
            first: url(1),
            last: url(last_page),
            prev: (page > 1).then(|| url(page - 1)),
            next: (page < last_page).then(|| url(page + 1)),
        };
        let meta = Meta {
            current_page: page,
            from,
            last_page,
            per_page,
            to,
            total,
        };
        Self {
            data,
            links: Some(links),
            meta: Some(meta),
        }
    }

    /// Dispatch on the resolved pagination of the request.
    #[must_use]
    pub fn for_page(
        data: Vec<R>,
        pagination: Pagination,
        total: u64,
        resource_plural: &str,
    ) -> Self {
        match pagination {
            Pagination::Disabled => Self::plain(data),
            Pagination::Page { page, per_page } => {
                Self::paginated(data, page, per_page, total, resource_plural)
            }
        }
    }
}

impl<R: Serialize> IntoResponse for Envelope<R> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
