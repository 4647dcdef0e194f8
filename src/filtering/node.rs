//! The abstract filter tree.
//!
//! Built once per request by [`super::parse`], consumed once by
//! [`crate::query::compile`], then discarded.

use serde::Deserialize;

/// How a node joins the run of siblings before it. The first node in a
/// sequence ignores its combinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    #[default]
    And,
    Or,
}

/// The enumerated comparison set. Anything else fails parsing with
/// `UnsupportedOperator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl FilterOperator {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "like" => Some(Self::Like),
            "in" => Some(Self::In),
            "not_in" | "notIn" => Some(Self::NotIn),
            "is_null" | "isNull" => Some(Self::IsNull),
            "is_not_null" | "isNotNull" => Some(Self::IsNotNull),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Like => "like",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::IsNull => "is_null",
            Self::IsNotNull => "is_not_null",
        }
    }

    /// `in`/`not_in` take a list; `is_null`/`is_not_null` take nothing;
    /// everything else takes a scalar.
    #[must_use]
    pub fn arity(self) -> OperatorArity {
        match self {
            Self::In | Self::NotIn => OperatorArity::List,
            Self::IsNull | Self::IsNotNull => OperatorArity::None,
            _ => OperatorArity::Scalar,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorArity {
    Scalar,
    List,
    None,
}

/// A leaf's operand, already arity-checked against the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Scalar(serde_json::Value),
    List(Vec<serde_json::Value>),
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Leaf {
        field: String,
        operator: FilterOperator,
        value: FilterValue,
        combinator: Combinator,
    },
    Group {
        combinator: Combinator,
        children: Vec<FilterNode>,
    },
}

impl FilterNode {
    #[must_use]
    pub fn combinator(&self) -> Combinator {
        match self {
            Self::Leaf { combinator, .. } | Self::Group { combinator, .. } => *combinator,
        }
    }

    /// Nesting depth: a leaf is 0, each group level adds 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf { .. } => 0,
            Self::Group { children, .. } => {
                1 + children.iter().map(Self::depth).max().unwrap_or(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_round_trip() {
        for raw in [
            "eq", "ne", "gt", "gte", "lt", "lte", "like", "in", "not_in", "is_null",
            "is_not_null",
        ] {
            let op = FilterOperator::parse(raw).unwrap();
            assert_eq!(op.as_str(), raw);
        }
    }

    #[test]
    fn camel_case_aliases_accepted() {
        assert_eq!(FilterOperator::parse("notIn"), Some(FilterOperator::NotIn));
        assert_eq!(FilterOperator::parse("isNull"), Some(FilterOperator::IsNull));
        assert_eq!(
            FilterOperator::parse("isNotNull"),
            Some(FilterOperator::IsNotNull)
        );
    }

    #[test]
    fn unknown_operator_rejected() {
        assert_eq!(FilterOperator::parse("between"), None);
        assert_eq!(FilterOperator::parse("EQ"), None);
        assert_eq!(FilterOperator::parse(""), None);
    }

    #[test]
    fn depth_counts_group_levels() {
        let leaf = FilterNode::Leaf {
            field: "title".to_string(),
            operator: FilterOperator::Eq,
            value: FilterValue::Scalar(serde_json::json!("a")),
            combinator: Combinator::And,
        };
        assert_eq!(leaf.depth(), 0);

        let group = FilterNode::Group {
            combinator: Combinator::And,
            children: vec![leaf.clone()],
        };
        assert_eq!(group.depth(), 1);

        let nested = FilterNode::Group {
            combinator: Combinator::Or,
            children: vec![leaf, group],
        };
        assert_eq!(nested.depth(), 2);
    }
}
