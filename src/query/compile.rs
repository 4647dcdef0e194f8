//! [`QuerySpec`] to Sea-ORM query compilation.
//!
//! Filter trees compile to [`Condition`] values with SQL-style precedence:
//! a run of AND-joined siblings binds tighter than the `or` combinators
//! separating the runs, so `a AND b OR c` becomes `(a AND b) OR c`.
//! Explicit groups always get their own parentheses.

use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Select};
use uuid::Uuid;

use super::spec::{QuerySpec, TrashedScope};
use crate::errors::CrudError;
use crate::filtering::{
    Combinator, FilterNode, FilterOperator, FilterValue, build_search_condition,
};
use crate::traits::CrudResource;

/// Compile a spec into a ready-to-run select. Pagination is not applied
/// here; callers paginate or stream the select themselves.
pub fn compile<R: CrudResource>(spec: &QuerySpec) -> Result<Select<R::EntityType>, CrudError> {
    let mut query = R::EntityType::find();

    if let Some(node) = spec.filter() {
        query = query.filter(compile_filter::<R>(node)?);
    }
    if let Some(search) = spec.search() {
        if let Some(condition) = build_search_condition::<R>(search) {
            query = query.filter(condition);
        }
    }
    if let Some(keys) = spec.key_scope() {
        let values: Vec<Uuid> = keys.to_vec();
        query = query.filter(R::ID_COLUMN.is_in(values));
    }
    query = apply_trashed_scope::<R>(query, spec.trashed());

    let sortable = R::sortable_columns();
    for directive in spec.sorts() {
        let column = lookup_column(&sortable, &directive.field)?;
        query = query.order_by(column, directive.direction.to_order());
    }

    Ok(query)
}

/// The select used by batch fetches: a fixed key set under a trashed scope,
/// ordered by key so mutation order is deterministic.
pub fn compile_keys<R: CrudResource>(
    keys: &[Uuid],
    scope: TrashedScope,
) -> Result<Select<R::EntityType>, CrudError> {
    let spec = QuerySpec::default()
        .with_key_scope(keys.to_vec())
        .with_trashed_scope(scope);
    Ok(compile::<R>(&spec)?.order_by_asc(R::ID_COLUMN))
}

pub fn compile_filter<R: CrudResource>(node: &FilterNode) -> Result<Condition, CrudError> {
    compile_filter_with(&R::filterable_columns(), node)
}

/// Column-table driven core, usable against related entities' columns.
pub fn compile_filter_with<C: ColumnTrait>(
    columns: &[(&'static str, C)],
    node: &FilterNode,
) -> Result<Condition, CrudError> {
    match node {
        FilterNode::Group { children, .. } => compile_group(columns, children),
        FilterNode::Leaf {
            field,
            operator,
            value,
            ..
        } => compile_leaf(lookup_column(columns, field)?, *operator, value),
    }
}

fn compile_group<C: ColumnTrait>(
    columns: &[(&'static str, C)],
    children: &[FilterNode],
) -> Result<Condition, CrudError> {
    // Split the sibling sequence into AND-runs at each `or` combinator,
    // then join the runs with OR.
    let mut runs: Vec<Condition> = Vec::new();
    let mut current = Condition::all();
    for (index, child) in children.iter().enumerate() {
        if index > 0 && child.combinator() == Combinator::Or {
            runs.push(current);
            current = Condition::all();
        }
        current = current.add(compile_filter_with(columns, child)?);
    }
    runs.push(current);

    if runs.len() == 1 {
        return Ok(runs.remove(0));
    }
    let mut any = Condition::any();
    for run in runs {
        any = any.add(run);
    }
    Ok(any)
}

fn compile_leaf<C: ColumnTrait>(
    column: C,
    operator: FilterOperator,
    value: &FilterValue,
) -> Result<Condition, CrudError> {
    let expr = match (operator, value) {
        (FilterOperator::Eq, FilterValue::Scalar(v)) => column.eq(scalar_value(v)?),
        (FilterOperator::Ne, FilterValue::Scalar(v)) => column.ne(scalar_value(v)?),
        (FilterOperator::Gt, FilterValue::Scalar(v)) => column.gt(scalar_value(v)?),
        (FilterOperator::Gte, FilterValue::Scalar(v)) => column.gte(scalar_value(v)?),
        (FilterOperator::Lt, FilterValue::Scalar(v)) => column.lt(scalar_value(v)?),
        (FilterOperator::Lte, FilterValue::Scalar(v)) => column.lte(scalar_value(v)?),
        (FilterOperator::Like, FilterValue::Scalar(v)) => {
            let pattern = v.as_str().ok_or_else(|| {
                CrudError::malformed_filter("'like' requires a string pattern")
            })?;
            column.like(pattern)
        }
        (FilterOperator::In, FilterValue::List(items)) => {
            column.is_in(scalar_values(items)?)
        }
        (FilterOperator::NotIn, FilterValue::List(items)) => {
            column.is_not_in(scalar_values(items)?)
        }
        (FilterOperator::IsNull, FilterValue::None) => column.is_null(),
        (FilterOperator::IsNotNull, FilterValue::None) => column.is_not_null(),
        (operator, _) => {
            return Err(CrudError::malformed_filter(format!(
                "operator '{}' received a mismatched value",
                operator.as_str()
            )));
        }
    };
    Ok(Condition::all().add(expr))
}

pub(crate) fn apply_trashed_scope<R: CrudResource>(
    query: Select<R::EntityType>,
    scope: TrashedScope,
) -> Select<R::EntityType> {
    match (R::soft_delete_column(), scope) {
        (Some(column), TrashedScope::Live) => query.filter(column.is_null()),
        (Some(column), TrashedScope::OnlyTrashed) => query.filter(column.is_not_null()),
        _ => query,
    }
}

fn lookup_column<C: ColumnTrait>(
    columns: &[(&'static str, C)],
    field: &str,
) -> Result<C, CrudError> {
    columns
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, column)| *column)
        .ok_or_else(|| CrudError::malformed_filter(format!("unknown field '{field}'")))
}

fn scalar_values(items: &[serde_json::Value]) -> Result<Vec<sea_orm::Value>, CrudError> {
    items.iter().map(scalar_value).collect()
}

/// JSON scalar to database value. UUID-shaped strings become native UUIDs
/// so key columns compare correctly on backends with a real UUID type.
fn scalar_value(value: &serde_json::Value) -> Result<sea_orm::Value, CrudError> {
    match value {
        serde_json::Value::Bool(b) => Ok((*b).into()),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i.into())
            } else if let Some(f) = n.as_f64() {
                Ok(f.into())
            } else {
                Err(CrudError::malformed_filter("unrepresentable number"))
            }
        }
        serde_json::Value::String(s) => match Uuid::parse_str(s) {
            Ok(id) => Ok(id.into()),
            Err(_) => Ok(s.clone().into()),
        },
        _ => Err(CrudError::malformed_filter("expected a scalar value")),
    }
}
