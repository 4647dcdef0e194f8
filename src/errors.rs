//! # Error handling
//!
//! One error type for the whole request-to-query pipeline. Each variant maps
//! to a stable HTTP status so the transport layer can serialize errors
//! without inspecting their contents, and internal database details are
//! logged through `tracing` rather than sent to clients.
//!
//! Parse and validation errors (`MalformedFilter`, `UnsupportedOperator`,
//! `NestingLimitExceeded`, `RelationNotAllowed`) are raised before any
//! transaction opens. Errors raised inside a batch loop roll back the batch
//! transaction and surface unchanged.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum CrudError {
    /// 422 - filter body is not valid: bad node shape, wrong value arity,
    /// or a field outside the filterable allow-list
    MalformedFilter {
        message: String,
    },

    /// 422 - filter leaf names an operator outside the supported set
    UnsupportedOperator {
        operator: String,
    },

    /// 422 - filter tree or relation path nests deeper than `max_nested_depth`
    NestingLimitExceeded {
        depth: usize,
        max: usize,
    },

    /// 422 - requested relation path is not on the resource allow-list
    RelationNotAllowed {
        path: String,
    },

    /// 403 - the authorization checker rejected the ability for this subject
    Authorization {
        message: String,
    },

    /// 404 - entity missing; after a mutation this signals a consistency
    /// violation (the re-fetch found nothing inside the same transaction)
    NotFound {
        resource: String,
        id: Option<String>,
    },

    /// 500 - begin/commit/rollback failed at the store
    Transaction {
        message: String,
        internal: DbErr,
    },

    /// 500 - any other database error (details logged, not exposed)
    Database {
        message: String,
        internal: DbErr,
    },
}

impl CrudError {
    pub fn malformed_filter(message: impl Into<String>) -> Self {
        Self::MalformedFilter {
            message: message.into(),
        }
    }

    pub fn unsupported_operator(operator: impl Into<String>) -> Self {
        Self::UnsupportedOperator {
            operator: operator.into(),
        }
    }

    pub fn nesting_limit(depth: usize, max: usize) -> Self {
        Self::NestingLimitExceeded { depth, max }
    }

    pub fn relation_not_allowed(path: impl Into<String>) -> Self {
        Self::RelationNotAllowed { path: path.into() }
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>, id: Option<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id,
        }
    }

    pub fn transaction(err: DbErr) -> Self {
        Self::Transaction {
            message: "The operation could not be completed".to_string(),
            internal: err,
        }
    }

    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedFilter { .. }
            | Self::UnsupportedOperator { .. }
            | Self::NestingLimitExceeded { .. }
            | Self::RelationNotAllowed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Authorization { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Transaction { .. } | Self::Database { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// User-facing message, free of database internals.
    fn user_message(&self) -> String {
        match self {
            Self::MalformedFilter { message } => format!("Malformed filter: {message}"),
            Self::UnsupportedOperator { operator } => {
                format!("Unsupported filter operator '{operator}'")
            }
            Self::NestingLimitExceeded { depth, max } => {
                format!("Nesting depth {depth} exceeds the configured maximum of {max}")
            }
            Self::RelationNotAllowed { path } => {
                format!("Relation '{path}' is not available on this resource")
            }
            Self::Authorization { message } => message.clone(),
            Self::NotFound { resource, id } => match id {
                Some(id) => format!("{resource} with ID '{id}' not found"),
                None => format!("{resource} not found"),
            },
            Self::Transaction { message, .. } | Self::Database { message, .. } => message.clone(),
        }
    }

    /// Log internal details. Only emits if the caller set up a `tracing`
    /// subscriber.
    fn log_internal(&self) {
        match self {
            Self::Transaction { internal, .. } => {
                tracing::error!(error = ?internal, "transaction boundary failure");
            }
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "database error occurred");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "request rejected"
                );
            }
        }
    }
}

/// Sanitized error body sent to clients.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for CrudError {
    fn into_response(self) -> Response {
        self.log_internal();
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.user_message(),
        };
        (status, Json(body)).into_response()
    }
}

impl fmt::Display for CrudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for CrudError {}

/// `RecordNotFound` keeps its 404 semantics; every other database error is
/// sanitized into a 500.
impl From<DbErr> for CrudError {
    fn from(err: DbErr) -> Self {
        match &err {
            DbErr::RecordNotFound(msg) => {
                let resource = msg.split_whitespace().next().unwrap_or("Resource");
                Self::NotFound {
                    resource: resource.to_string(),
                    id: None,
                }
            }
            _ => Self::database(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_map_to_422() {
        for err in [
            CrudError::malformed_filter("value must be a list"),
            CrudError::unsupported_operator("between"),
            CrudError::nesting_limit(3, 1),
            CrudError::relation_not_allowed("author.secrets"),
        ] {
            assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn authorization_maps_to_403() {
        let err = CrudError::authorization("not allowed to update post");
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.user_message(), "not allowed to update post");
    }

    #[test]
    fn not_found_with_and_without_id() {
        let err = CrudError::not_found("Post", Some("42".to_string()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.user_message(), "Post with ID '42' not found");

        let err = CrudError::not_found("Post", None);
        assert_eq!(err.user_message(), "Post not found");
    }

    #[test]
    fn database_errors_are_sanitized() {
        let err = CrudError::database(DbErr::Custom("secret connection string".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "A database error occurred");
    }

    #[test]
    fn transaction_errors_are_sanitized() {
        let err = CrudError::transaction(DbErr::Custom("commit failed".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "The operation could not be completed");
    }

    #[test]
    fn dberr_record_not_found_becomes_404() {
        let err: CrudError = DbErr::RecordNotFound("Post not found".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(err.user_message().contains("not found"));
    }

    #[test]
    fn other_dberr_become_500() {
        for db_err in [
            DbErr::Custom("any".to_string()),
            DbErr::Type("type error".to_string()),
            DbErr::Json("json error".to_string()),
        ] {
            let err: CrudError = db_err.into();
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(err.user_message(), "A database error occurred");
        }
    }

    #[test]
    fn display_matches_user_message() {
        let err = CrudError::unsupported_operator("regex");
        assert_eq!(format!("{err}"), "Unsupported filter operator 'regex'");
    }
}
