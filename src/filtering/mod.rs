//! Request-level filter, search, and sort handling.
//!
//! Everything here turns untrusted wire input into validated, typed values.
//! The query layer in [`crate::query`] consumes those values; nothing in
//! this module touches the database.

pub mod node;
pub mod parse;
pub mod search;
pub mod sort;

pub use node::{Combinator, FilterNode, FilterOperator, FilterValue, OperatorArity};
pub use parse::{parse_filter, parse_filter_param, parse_filter_with};
pub use search::{SearchSpec, build_search_condition, build_search_condition_with};
pub use sort::{SortDirection, SortDirective, parse_sort_param, validate_sorts};
