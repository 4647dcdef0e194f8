use sea_orm::Order;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::errors::CrudError;
use crate::traits::CrudResource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn to_order(self) -> Order {
        match self {
            Self::Asc => Order::Asc,
            Self::Desc => Order::Desc,
        }
    }
}

/// One ordering clause. Query-string form is `field:direction`, body form
/// is `{"field": ..., "direction": ...}`; direction defaults to ascending.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct SortDirective {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// Parse the comma-separated `sort` query parameter for a resource.
pub fn parse_sort_param<R: CrudResource>(raw: &str) -> Result<Vec<SortDirective>, CrudError> {
    let directives = raw
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(parse_directive)
        .collect::<Result<Vec<_>, _>>()?;
    validate_sorts::<R>(&directives)?;
    Ok(directives)
}

fn parse_directive(part: &str) -> Result<SortDirective, CrudError> {
    let part = part.trim();
    let (field, direction) = match part.split_once(':') {
        None => (part, SortDirection::Asc),
        Some((field, "asc")) => (field, SortDirection::Asc),
        Some((field, "desc")) => (field, SortDirection::Desc),
        Some((_, other)) => {
            return Err(CrudError::malformed_filter(format!(
                "sort direction must be 'asc' or 'desc', got '{other}'"
            )));
        }
    };
    if field.is_empty() {
        return Err(CrudError::malformed_filter("sort field cannot be empty"));
    }
    Ok(SortDirective {
        field: field.to_string(),
        direction,
    })
}

/// Check body-supplied directives against the resource's sortable columns.
pub fn validate_sorts<R: CrudResource>(directives: &[SortDirective]) -> Result<(), CrudError> {
    let allowed: Vec<&str> = R::sortable_columns()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    validate_sorts_with(directives, &allowed)
}

pub fn validate_sorts_with(
    directives: &[SortDirective],
    allowed: &[&str],
) -> Result<(), CrudError> {
    for directive in directives {
        if !allowed.contains(&directive.field.as_str()) {
            return Err(CrudError::malformed_filter(format!(
                "field '{}' is not sortable",
                directive.field
            )));
        }
    }
    Ok(())
}
