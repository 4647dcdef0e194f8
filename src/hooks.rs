//! Lifecycle hooks around batch operations.
//!
//! Hooks come as one strategy object per verb family, bound at
//! registration. Batch-level hooks may short-circuit with a prepared
//! response; when one does, the transaction still commits with whatever the
//! hook wrote. Per-entity hooks signal only success or failure, and any
//! failure rolls the whole batch back.

use async_trait::async_trait;
use sea_orm::{DatabaseTransaction, EntityTrait};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::errors::CrudError;
use crate::response::Envelope;
use crate::traits::CrudResource;

/// What a batch-level hook decided.
pub enum HookOutcome<R> {
    /// Proceed with the operation.
    Continue,
    /// Skip the rest of the operation and return this response.
    Respond(Envelope<R>),
}

type Model<R> = <<R as CrudResource>::EntityType as EntityTrait>::Model;

#[async_trait]
pub trait StoreHooks<R: CrudResource>: Send + Sync {
    async fn before_batch_store(
        &self,
        tx: &DatabaseTransaction,
        payload: &[R::CreateModel],
    ) -> Result<HookOutcome<R>, CrudError> {
        let _ = (tx, payload);
        Ok(HookOutcome::Continue)
    }

    async fn before_store(
        &self,
        tx: &DatabaseTransaction,
        data: &R::CreateModel,
    ) -> Result<(), CrudError> {
        let _ = (tx, data);
        Ok(())
    }

    async fn before_save(
        &self,
        tx: &DatabaseTransaction,
        data: &R::CreateModel,
    ) -> Result<(), CrudError> {
        let _ = (tx, data);
        Ok(())
    }

    async fn after_save(&self, tx: &DatabaseTransaction, entity: &Model<R>) -> Result<(), CrudError> {
        let _ = (tx, entity);
        Ok(())
    }

    async fn after_store(
        &self,
        tx: &DatabaseTransaction,
        entity: &Model<R>,
    ) -> Result<(), CrudError> {
        let _ = (tx, entity);
        Ok(())
    }

    async fn after_batch_store(
        &self,
        tx: &DatabaseTransaction,
        entities: &[Model<R>],
    ) -> Result<HookOutcome<R>, CrudError> {
        let _ = (tx, entities);
        Ok(HookOutcome::Continue)
    }
}

#[async_trait]
pub trait UpdateHooks<R: CrudResource>: Send + Sync {
    async fn before_batch_update(
        &self,
        tx: &DatabaseTransaction,
        payload: &BTreeMap<Uuid, R::UpdateModel>,
    ) -> Result<HookOutcome<R>, CrudError> {
        let _ = (tx, payload);
        Ok(HookOutcome::Continue)
    }

    async fn before_update(
        &self,
        tx: &DatabaseTransaction,
        entity: &Model<R>,
        data: &R::UpdateModel,
    ) -> Result<(), CrudError> {
        let _ = (tx, entity, data);
        Ok(())
    }

    async fn before_save(
        &self,
        tx: &DatabaseTransaction,
        entity: &Model<R>,
        data: &R::UpdateModel,
    ) -> Result<(), CrudError> {
        let _ = (tx, entity, data);
        Ok(())
    }

    async fn after_save(&self, tx: &DatabaseTransaction, entity: &Model<R>) -> Result<(), CrudError> {
        let _ = (tx, entity);
        Ok(())
    }

    async fn after_update(
        &self,
        tx: &DatabaseTransaction,
        entity: &Model<R>,
    ) -> Result<(), CrudError> {
        let _ = (tx, entity);
        Ok(())
    }

    async fn after_batch_update(
        &self,
        tx: &DatabaseTransaction,
        entities: &[Model<R>],
    ) -> Result<HookOutcome<R>, CrudError> {
        let _ = (tx, entities);
        Ok(HookOutcome::Continue)
    }
}

#[async_trait]
pub trait DestroyHooks<R: CrudResource>: Send + Sync {
    async fn before_batch_destroy(
        &self,
        tx: &DatabaseTransaction,
        keys: &[Uuid],
    ) -> Result<HookOutcome<R>, CrudError> {
        let _ = (tx, keys);
        Ok(HookOutcome::Continue)
    }

    async fn before_destroy(
        &self,
        tx: &DatabaseTransaction,
        entity: &Model<R>,
        force: bool,
    ) -> Result<(), CrudError> {
        let _ = (tx, entity, force);
        Ok(())
    }

    async fn after_destroy(
        &self,
        tx: &DatabaseTransaction,
        entity: &Model<R>,
    ) -> Result<(), CrudError> {
        let _ = (tx, entity);
        Ok(())
    }

    async fn after_batch_destroy(
        &self,
        tx: &DatabaseTransaction,
        entities: &[Model<R>],
    ) -> Result<HookOutcome<R>, CrudError> {
        let _ = (tx, entities);
        Ok(HookOutcome::Continue)
    }
}

#[async_trait]
pub trait RestoreHooks<R: CrudResource>: Send + Sync {
    async fn before_batch_restore(
        &self,
        tx: &DatabaseTransaction,
        keys: &[Uuid],
    ) -> Result<HookOutcome<R>, CrudError> {
        let _ = (tx, keys);
        Ok(HookOutcome::Continue)
    }

    async fn before_restore(
        &self,
        tx: &DatabaseTransaction,
        entity: &Model<R>,
    ) -> Result<(), CrudError> {
        let _ = (tx, entity);
        Ok(())
    }

    async fn after_restore(
        &self,
        tx: &DatabaseTransaction,
        entity: &Model<R>,
    ) -> Result<(), CrudError> {
        let _ = (tx, entity);
        Ok(())
    }

    async fn after_batch_restore(
        &self,
        tx: &DatabaseTransaction,
        entities: &[Model<R>],
    ) -> Result<HookOutcome<R>, CrudError> {
        let _ = (tx, entities);
        Ok(HookOutcome::Continue)
    }
}

/// The full hook set a context carries.
pub trait Hooks<R: CrudResource>:
    StoreHooks<R> + UpdateHooks<R> + DestroyHooks<R> + RestoreHooks<R>
{
}

impl<R: CrudResource, T> Hooks<R> for T where
    T: StoreHooks<R> + UpdateHooks<R> + DestroyHooks<R> + RestoreHooks<R>
{
}

/// Hook set that never intervenes; the default at registration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

#[async_trait]
impl<R: CrudResource> StoreHooks<R> for NoopHooks {}
#[async_trait]
impl<R: CrudResource> UpdateHooks<R> for NoopHooks {}
#[async_trait]
impl<R: CrudResource> DestroyHooks<R> for NoopHooks {}
#[async_trait]
impl<R: CrudResource> RestoreHooks<R> for NoopHooks {}
