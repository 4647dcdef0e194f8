//! Raw JSON to [`FilterNode`] parsing.
//!
//! Validation happens entirely here so the query compiler can assume a
//! well-formed tree: operator membership, value arity, field allow-listing,
//! and the nesting bound all fail before any transaction opens.

use serde_json::Value;

use super::node::{Combinator, FilterNode, FilterOperator, FilterValue, OperatorArity};
use crate::config::CrudConfig;
use crate::errors::CrudError;
use crate::traits::CrudResource;

/// Parse the JSON-encoded `filter` query parameter for a resource.
pub fn parse_filter_param<R: CrudResource>(
    raw: &str,
    config: &CrudConfig,
) -> Result<FilterNode, CrudError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| CrudError::malformed_filter(format!("invalid JSON: {e}")))?;
    parse_filter::<R>(&value, config)
}

/// Parse a native JSON filter tree (search body form) for a resource.
pub fn parse_filter<R: CrudResource>(
    value: &Value,
    config: &CrudConfig,
) -> Result<FilterNode, CrudError> {
    let allowed: Vec<&str> = R::filterable_columns()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    parse_filter_with(value, &allowed, config.max_nested_depth)
}

/// Allow-list driven parser core. Public so relation loaders can parse
/// nested filter trees against the related resource's own field list.
pub fn parse_filter_with(
    value: &Value,
    allowed_fields: &[&str],
    max_nested_depth: usize,
) -> Result<FilterNode, CrudError> {
    let Value::Array(items) = value else {
        return Err(CrudError::malformed_filter(
            "filter root must be an array of nodes",
        ));
    };
    let children = parse_nodes(items, allowed_fields, 0, max_nested_depth)?;
    Ok(FilterNode::Group {
        combinator: Combinator::And,
        children,
    })
}

fn parse_nodes(
    items: &[Value],
    allowed: &[&str],
    depth: usize,
    max: usize,
) -> Result<Vec<FilterNode>, CrudError> {
    items
        .iter()
        .map(|item| parse_node(item, allowed, depth, max))
        .collect()
}

fn parse_node(
    item: &Value,
    allowed: &[&str],
    depth: usize,
    max: usize,
) -> Result<FilterNode, CrudError> {
    let Value::Object(obj) = item else {
        return Err(CrudError::malformed_filter(
            "each filter node must be an object",
        ));
    };

    let combinator = parse_combinator(obj.get("combinator"))?;

    if let Some(nested) = obj.get("nested") {
        let Value::Array(children) = nested else {
            return Err(CrudError::malformed_filter("'nested' must be an array"));
        };
        let group_depth = depth + 1;
        if group_depth > max {
            return Err(CrudError::nesting_limit(group_depth, max));
        }
        let children = parse_nodes(children, allowed, group_depth, max)?;
        return Ok(FilterNode::Group {
            combinator,
            children,
        });
    }

    let field = match obj.get("field") {
        Some(Value::String(field)) => field.clone(),
        Some(_) => return Err(CrudError::malformed_filter("'field' must be a string")),
        None => {
            return Err(CrudError::malformed_filter(
                "filter node needs either 'field' or 'nested'",
            ));
        }
    };
    if !allowed.contains(&field.as_str()) {
        return Err(CrudError::malformed_filter(format!(
            "field '{field}' is not filterable"
        )));
    }

    let operator = match obj.get("operator") {
        Some(Value::String(raw)) => {
            FilterOperator::parse(raw).ok_or_else(|| CrudError::unsupported_operator(raw))?
        }
        Some(_) => return Err(CrudError::malformed_filter("'operator' must be a string")),
        None => return Err(CrudError::malformed_filter("filter leaf needs 'operator'")),
    };

    let value = parse_value(operator, obj.get("value"), &field)?;

    Ok(FilterNode::Leaf {
        field,
        operator,
        value,
        combinator,
    })
}

fn parse_combinator(raw: Option<&Value>) -> Result<Combinator, CrudError> {
    match raw {
        None => Ok(Combinator::And),
        Some(Value::String(s)) => match s.as_str() {
            "and" => Ok(Combinator::And),
            "or" => Ok(Combinator::Or),
            other => Err(CrudError::malformed_filter(format!(
                "combinator must be 'and' or 'or', got '{other}'"
            ))),
        },
        Some(_) => Err(CrudError::malformed_filter("'combinator' must be a string")),
    }
}

fn parse_value(
    operator: FilterOperator,
    raw: Option<&Value>,
    field: &str,
) -> Result<FilterValue, CrudError> {
    match operator.arity() {
        OperatorArity::None => match raw {
            None | Some(Value::Null) => Ok(FilterValue::None),
            Some(_) => Err(CrudError::malformed_filter(format!(
                "operator '{}' takes no value (field '{field}')",
                operator.as_str()
            ))),
        },
        OperatorArity::List => match raw {
            Some(Value::Array(items)) => {
                for item in items {
                    ensure_scalar(item, field)?;
                }
                Ok(FilterValue::List(items.clone()))
            }
            _ => Err(CrudError::malformed_filter(format!(
                "operator '{}' requires a list value (field '{field}')",
                operator.as_str()
            ))),
        },
        OperatorArity::Scalar => match raw {
            Some(value) if value.is_string() || value.is_number() || value.is_boolean() => {
                Ok(FilterValue::Scalar(value.clone()))
            }
            _ => Err(CrudError::malformed_filter(format!(
                "operator '{}' requires a scalar value (field '{field}')",
                operator.as_str()
            ))),
        },
    }
}

fn ensure_scalar(value: &Value, field: &str) -> Result<(), CrudError> {
    if value.is_string() || value.is_number() || value.is_boolean() {
        Ok(())
    } else {
        Err(CrudError::malformed_filter(format!(
            "list values must be scalars (field '{field}')"
        )))
    }
}
