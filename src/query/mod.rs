//! Query description and compilation.

pub mod compile;
pub mod spec;

pub use compile::{compile, compile_filter, compile_filter_with, compile_keys};
pub use spec::{
    Pagination, QuerySpec, TrashedScope, resolve_pagination, trashed_scope_from_params,
};
