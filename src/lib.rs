pub mod auth;
pub mod config;
pub mod errors;
pub mod filtering;
pub mod hooks;
pub mod models;
pub mod operations;
pub mod query;
pub mod relations;
pub mod response;
pub mod traits;

pub use auth::{Ability, AllowAll, Authorizer};
pub use config::CrudConfig;
pub use errors::CrudError;
pub use hooks::{DestroyHooks, HookOutcome, Hooks, NoopHooks, RestoreHooks, StoreHooks, UpdateHooks};
pub use models::{BatchKeys, BatchStore, BatchUpdate, ListParams, SearchBody};
pub use operations::CrudContext;
pub use query::{QuerySpec, TrashedScope};
pub use relations::RelationRequest;
pub use response::Envelope;
pub use traits::{CrudResource, MergeIntoActiveModel};
