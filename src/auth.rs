use async_trait::async_trait;
use sea_orm::EntityTrait;

use crate::errors::CrudError;
use crate::traits::CrudResource;

/// What an operation is about to do with a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ability {
    List,
    View,
    Create,
    Update,
    Delete,
    ForceDelete,
    Restore,
}

/// Authorization policy for one resource type, fixed at registration.
///
/// `Create` is checked once per batch at the collection level; every other
/// ability is checked against each fetched entity. A failure aborts the
/// operation and rolls back its transaction.
#[async_trait]
pub trait Authorizer<R: CrudResource>: Send + Sync {
    async fn authorize_collection(&self, ability: Ability) -> Result<(), CrudError> {
        let _ = ability;
        Ok(())
    }

    async fn authorize(
        &self,
        ability: Ability,
        entity: &<R::EntityType as EntityTrait>::Model,
    ) -> Result<(), CrudError> {
        let _ = (ability, entity);
        Ok(())
    }
}

/// Policy that permits everything; the default at registration.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl<R: CrudResource> Authorizer<R> for AllowAll {}
