use sea_orm::Condition;
use sea_orm::sea_query::{Alias, Expr, ExprTrait, Func, SimpleExpr};

use crate::config::SearchConfig;
use crate::models::SearchTerm;
use crate::traits::CrudResource;

// Basic safety limit on the raw search term
const MAX_SEARCH_TERM_LENGTH: usize = 10_000;

/// Resolved search request: the term plus the effective case sensitivity
/// after the per-request override is applied over the registered config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSpec {
    pub term: String,
    pub case_sensitive: bool,
}

impl SearchSpec {
    #[must_use]
    pub fn new(term: impl Into<String>, case_sensitive: bool) -> Self {
        Self {
            term: term.into(),
            case_sensitive,
        }
    }

    /// From the `q` query parameter, which cannot override sensitivity.
    #[must_use]
    pub fn from_query_param(term: &str, config: &SearchConfig) -> Self {
        Self::new(term, config.case_sensitive)
    }

    /// From the search body object, where `case_sensitive` may override
    /// the registered default.
    #[must_use]
    pub fn from_body(body: &SearchTerm, config: &SearchConfig) -> Self {
        Self::new(
            body.value.as_str(),
            body.case_sensitive.unwrap_or(config.case_sensitive),
        )
    }
}

/// Escape LIKE wildcards so user terms match literally.
/// Escapes: % (match any) and _ (match single char)
fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Build the OR-of-LIKEs condition across a resource's searchable columns.
/// Returns `None` when the resource declares no searchable columns or the
/// term is blank, in which case the search clause is skipped entirely.
#[must_use]
pub fn build_search_condition<R: CrudResource>(spec: &SearchSpec) -> Option<Condition> {
    let columns: Vec<&str> = R::searchable_columns()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    build_search_condition_with(spec, &columns)
}

/// Column-name driven core, usable against related resources too.
#[must_use]
pub fn build_search_condition_with(spec: &SearchSpec, columns: &[&str]) -> Option<Condition> {
    let trimmed = truncate_term(&spec.term).trim();
    if columns.is_empty() || trimmed.is_empty() {
        return None;
    }

    let mut condition = Condition::any();
    for name in columns {
        condition = condition.add(like_expr(name, trimmed, spec.case_sensitive));
    }
    Some(condition)
}

/// Cap the raw term, stepping back to a character boundary so multi-byte
/// input never splits mid-character.
fn truncate_term(term: &str) -> &str {
    if term.len() <= MAX_SEARCH_TERM_LENGTH {
        return term;
    }
    let mut end = MAX_SEARCH_TERM_LENGTH;
    while !term.is_char_boundary(end) {
        end -= 1;
    }
    &term[..end]
}

fn like_expr(column: &str, term: &str, case_sensitive: bool) -> SimpleExpr {
    // Expr::col() quotes the column name instead of string interpolation
    let column = Expr::col(Alias::new(column));
    let escaped = escape_like_wildcards(term);

    if case_sensitive {
        column.like(format!("%{escaped}%"))
    } else {
        // UPPER(column) LIKE UPPER-cased pattern for portable folding
        Func::upper(column).like(format!("%{}%", escaped.to_uppercase()))
    }
}
