//! Collection endpoints and the transactional batch engine.
//!
//! Every batch verb runs inside one transaction: a failing authorization
//! check, hook, or statement rolls back the whole batch. A batch-level hook
//! responding early is not a failure; the transaction commits with whatever
//! the hook already wrote.

use sea_orm::{DatabaseConnection, DatabaseTransaction, PaginatorTrait, TransactionTrait};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{Ability, AllowAll, Authorizer};
use crate::config::CrudConfig;
use crate::errors::CrudError;
use crate::hooks::{
    DestroyHooks, HookOutcome, Hooks, NoopHooks, RestoreHooks, StoreHooks, UpdateHooks,
};
use crate::models::{BatchKeys, BatchStore, BatchUpdate, ListParams, SearchBody};
use crate::query::{
    Pagination, QuerySpec, TrashedScope, compile, compile_keys, trashed_scope_from_params,
};
use crate::relations::{RelationRequest, guard_relations_for_collection, requested_relations};
use crate::response::Envelope;
use crate::traits::CrudResource;

type Model<R> = <<R as CrudResource>::EntityType as sea_orm::EntityTrait>::Model;

/// Everything one registered resource needs to serve requests: the
/// connection, the resolved configuration, the authorization policy, and
/// the hook set. Built once at registration and immutable afterwards.
pub struct CrudContext<R: CrudResource> {
    db: DatabaseConnection,
    config: CrudConfig,
    authorizer: Arc<dyn Authorizer<R>>,
    hooks: Arc<dyn Hooks<R>>,
}

impl<R: CrudResource> Clone for CrudContext<R> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            config: self.config.clone(),
            authorizer: Arc::clone(&self.authorizer),
            hooks: Arc::clone(&self.hooks),
        }
    }
}

impl<R: CrudResource> CrudContext<R> {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            config: CrudConfig::default(),
            authorizer: Arc::new(AllowAll),
            hooks: Arc::new(NoopHooks),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: CrudConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_authorizer(mut self, authorizer: impl Authorizer<R> + 'static) -> Self {
        self.authorizer = Arc::new(authorizer);
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: impl Hooks<R> + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    #[must_use]
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    #[must_use]
    pub fn config(&self) -> &CrudConfig {
        &self.config
    }

    /// `GET /{resource}`: filtered, searched, sorted, paginated collection.
    pub async fn list(&self, params: &ListParams) -> Result<Envelope<R>, CrudError> {
        self.authorizer.authorize_collection(Ability::List).await?;
        let spec = QuerySpec::from_params::<R>(params, &self.config)?;
        let relations =
            requested_relations::<R>(params.include.as_deref(), None, &self.config)?;
        self.run_collection(&spec, &relations).await
    }

    /// `POST /{resource}/search`: the structured body form of [`Self::list`].
    pub async fn search(
        &self,
        params: &ListParams,
        body: &SearchBody,
    ) -> Result<Envelope<R>, CrudError> {
        self.authorizer.authorize_collection(Ability::List).await?;
        let spec = QuerySpec::from_search_body::<R>(body, params, &self.config)?;
        let relations = requested_relations::<R>(
            params.include.as_deref(),
            body.includes.as_deref(),
            &self.config,
        )?;
        self.run_collection(&spec, &relations).await
    }

    /// `GET /{resource}/{id}`: single entity with requested relations.
    pub async fn show(&self, id: Uuid, params: &ListParams) -> Result<R, CrudError> {
        let scope = trashed_scope_from_params(params);
        let model = R::fetch_by_key(&self.db, id, scope).await?;
        self.authorizer.authorize(Ability::View, &model).await?;

        let relations =
            requested_relations::<R>(params.include.as_deref(), None, &self.config)?;
        let mut resources = R::load_relations(&self.db, vec![model], &relations).await?;
        guard_relations_for_collection(&mut resources, &relations);
        resources
            .pop()
            .ok_or_else(|| CrudError::not_found(R::RESOURCE_NAME_SINGULAR, Some(id.to_string())))
    }

    async fn run_collection(
        &self,
        spec: &QuerySpec,
        relations: &[RelationRequest],
    ) -> Result<Envelope<R>, CrudError> {
        let query = compile::<R>(spec)?;
        let pagination = spec.pagination().unwrap_or(Pagination::Disabled);
        let (models, total) = match pagination {
            Pagination::Disabled => (query.all(&self.db).await?, 0),
            Pagination::Page { page, per_page } => {
                let paginator = query.paginate(&self.db, per_page.max(1));
                let total = paginator.num_items().await?;
                let models = paginator.fetch_page(page - 1).await?;
                (models, total)
            }
        };
        let mut resources = R::load_relations(&self.db, models, relations).await?;
        guard_relations_for_collection(&mut resources, relations);
        Ok(Envelope::for_page(
            resources,
            pagination,
            total,
            R::RESOURCE_NAME_PLURAL,
        ))
    }

    /// `POST /{resource}/batch`: create every entity or none.
    pub async fn batch_store(
        &self,
        params: &ListParams,
        payload: BatchStore<R::CreateModel>,
    ) -> Result<Envelope<R>, CrudError> {
        // validation failures must not cost a transaction
        let relations = self.batch_relations(params)?;
        let tx = self.begin().await?;
        match self.batch_store_in(&tx, &relations, payload).await {
            Ok(envelope) => {
                self.commit(tx).await?;
                Ok(envelope)
            }
            Err(err) => Err(self.rollback(tx, err).await),
        }
    }

    /// `PATCH /{resource}/batch`: update the fetched subset or nothing.
    pub async fn batch_update(
        &self,
        params: &ListParams,
        payload: BatchUpdate<R::UpdateModel>,
    ) -> Result<Envelope<R>, CrudError> {
        let relations = self.batch_relations(params)?;
        let scope = trashed_scope_from_params(params);
        let tx = self.begin().await?;
        match self.batch_update_in(&tx, scope, &relations, payload).await {
            Ok(envelope) => {
                self.commit(tx).await?;
                Ok(envelope)
            }
            Err(err) => Err(self.rollback(tx, err).await),
        }
    }

    /// `DELETE /{resource}/batch`: soft-delete, or remove when forced or
    /// the resource is not soft-deletable.
    pub async fn batch_destroy(
        &self,
        params: &ListParams,
        payload: BatchKeys,
    ) -> Result<Envelope<R>, CrudError> {
        let relations = self.batch_relations(params)?;
        let force = params.force.unwrap_or(false);
        let tx = self.begin().await?;
        match self.batch_destroy_in(&tx, force, &relations, payload).await {
            Ok(envelope) => {
                self.commit(tx).await?;
                Ok(envelope)
            }
            Err(err) => Err(self.rollback(tx, err).await),
        }
    }

    /// `POST /{resource}/batch/restore`: bring trashed entities back.
    pub async fn batch_restore(
        &self,
        params: &ListParams,
        payload: BatchKeys,
    ) -> Result<Envelope<R>, CrudError> {
        let relations = self.batch_relations(params)?;
        let tx = self.begin().await?;
        match self.batch_restore_in(&tx, &relations, payload).await {
            Ok(envelope) => {
                self.commit(tx).await?;
                Ok(envelope)
            }
            Err(err) => Err(self.rollback(tx, err).await),
        }
    }

    fn batch_relations(&self, params: &ListParams) -> Result<Vec<RelationRequest>, CrudError> {
        requested_relations::<R>(params.include.as_deref(), None, &self.config)
    }

    async fn begin(&self) -> Result<DatabaseTransaction, CrudError> {
        self.db
            .begin()
            .await
            .map_err(CrudError::transaction)
    }

    async fn commit(&self, tx: DatabaseTransaction) -> Result<(), CrudError> {
        tx.commit().await.map_err(CrudError::transaction)
    }

    async fn rollback(&self, tx: DatabaseTransaction, err: CrudError) -> CrudError {
        if let Err(rollback_err) = tx.rollback().await {
            tracing::error!(error = %rollback_err, "rollback failed after batch error");
        }
        err
    }

    async fn batch_store_in(
        &self,
        tx: &DatabaseTransaction,
        relations: &[RelationRequest],
        payload: BatchStore<R::CreateModel>,
    ) -> Result<Envelope<R>, CrudError> {
        let hooks = &*self.hooks;
        if let HookOutcome::Respond(envelope) =
            StoreHooks::before_batch_store(hooks, tx, &payload.resources).await?
        {
            return Ok(envelope);
        }
        self.authorizer.authorize_collection(Ability::Create).await?;

        let mut entities: Vec<Model<R>> = Vec::with_capacity(payload.resources.len());
        for data in payload.resources {
            StoreHooks::before_store(hooks, tx, &data).await?;
            StoreHooks::before_save(hooks, tx, &data).await?;
            let inserted = R::create(tx, data).await?;
            let key = R::key_of(&inserted)?;
            // re-fetch so database defaults and triggers are visible
            let entity = R::fetch_by_key(tx, key, TrashedScope::Live).await?;
            StoreHooks::after_save(hooks, tx, &entity).await?;
            StoreHooks::after_store(hooks, tx, &entity).await?;
            entities.push(entity);
        }

        if let HookOutcome::Respond(envelope) =
            StoreHooks::after_batch_store(hooks, tx, &entities).await?
        {
            return Ok(envelope);
        }
        self.respond(tx, relations, entities).await
    }

    async fn batch_update_in(
        &self,
        tx: &DatabaseTransaction,
        scope: TrashedScope,
        relations: &[RelationRequest],
        mut payload: BatchUpdate<R::UpdateModel>,
    ) -> Result<Envelope<R>, CrudError> {
        let hooks = &*self.hooks;
        if let HookOutcome::Respond(envelope) =
            UpdateHooks::before_batch_update(hooks, tx, &payload.resources).await?
        {
            return Ok(envelope);
        }

        let keys: Vec<Uuid> = payload.resources.keys().copied().collect();
        let models = compile_keys::<R>(&keys, scope)?.all(tx).await?;

        let mut entities: Vec<Model<R>> = Vec::with_capacity(models.len());
        for model in models {
            let key = R::key_of(&model)?;
            let Some(data) = payload.resources.remove(&key) else {
                continue;
            };
            self.authorizer.authorize(Ability::Update, &model).await?;
            UpdateHooks::before_update(hooks, tx, &model, &data).await?;
            UpdateHooks::before_save(hooks, tx, &model, &data).await?;
            R::update(tx, model, data).await?;
            let entity = R::fetch_by_key(tx, key, scope).await?;
            UpdateHooks::after_save(hooks, tx, &entity).await?;
            UpdateHooks::after_update(hooks, tx, &entity).await?;
            entities.push(entity);
        }

        if let HookOutcome::Respond(envelope) =
            UpdateHooks::after_batch_update(hooks, tx, &entities).await?
        {
            return Ok(envelope);
        }
        self.respond(tx, relations, entities).await
    }

    async fn batch_destroy_in(
        &self,
        tx: &DatabaseTransaction,
        force: bool,
        relations: &[RelationRequest],
        payload: BatchKeys,
    ) -> Result<Envelope<R>, CrudError> {
        let hooks = &*self.hooks;
        if let HookOutcome::Respond(envelope) =
            DestroyHooks::before_batch_destroy(hooks, tx, &payload.resources).await?
        {
            return Ok(envelope);
        }

        let soft_deletes = R::soft_delete_column().is_some();
        // forcing only means something on a soft-deletable resource
        let force = soft_deletes && force;
        // soft-deletable destroys fetch trashed rows too: an already
        // trashed row is re-stamped, not silently skipped
        let scope = if soft_deletes {
            TrashedScope::WithTrashed
        } else {
            TrashedScope::Live
        };
        let models = compile_keys::<R>(&payload.resources, scope)?.all(tx).await?;

        let mut entities: Vec<Model<R>> = Vec::with_capacity(models.len());
        for model in models {
            let key = R::key_of(&model)?;
            let ability = if force {
                Ability::ForceDelete
            } else {
                Ability::Delete
            };
            self.authorizer.authorize(ability, &model).await?;
            DestroyHooks::before_destroy(hooks, tx, &model, force).await?;
            if force || !soft_deletes {
                // the row is gone, the fetched model is the last state
                R::delete(tx, key).await?;
                DestroyHooks::after_destroy(hooks, tx, &model).await?;
                entities.push(model);
            } else {
                R::soft_delete(tx, key).await?;
                let entity = R::fetch_by_key(tx, key, TrashedScope::WithTrashed).await?;
                DestroyHooks::after_destroy(hooks, tx, &entity).await?;
                entities.push(entity);
            }
        }

        if let HookOutcome::Respond(envelope) =
            DestroyHooks::after_batch_destroy(hooks, tx, &entities).await?
        {
            return Ok(envelope);
        }
        self.respond(tx, relations, entities).await
    }

    async fn batch_restore_in(
        &self,
        tx: &DatabaseTransaction,
        relations: &[RelationRequest],
        payload: BatchKeys,
    ) -> Result<Envelope<R>, CrudError> {
        let hooks = &*self.hooks;
        if let HookOutcome::Respond(envelope) =
            RestoreHooks::before_batch_restore(hooks, tx, &payload.resources).await?
        {
            return Ok(envelope);
        }

        let models = compile_keys::<R>(&payload.resources, TrashedScope::OnlyTrashed)?
            .all(tx)
            .await?;

        let mut entities: Vec<Model<R>> = Vec::with_capacity(models.len());
        for model in models {
            let key = R::key_of(&model)?;
            self.authorizer.authorize(Ability::Restore, &model).await?;
            RestoreHooks::before_restore(hooks, tx, &model).await?;
            R::restore(tx, key).await?;
            let entity = R::fetch_by_key(tx, key, TrashedScope::Live).await?;
            RestoreHooks::after_restore(hooks, tx, &entity).await?;
            entities.push(entity);
        }

        if let HookOutcome::Respond(envelope) =
            RestoreHooks::after_batch_restore(hooks, tx, &entities).await?
        {
            return Ok(envelope);
        }
        self.respond(tx, relations, entities).await
    }

    /// Shared tail of every batch verb: attach requested relations, apply
    /// the relation guard, wrap in an unpaginated envelope.
    async fn respond(
        &self,
        tx: &DatabaseTransaction,
        relations: &[RelationRequest],
        entities: Vec<Model<R>>,
    ) -> Result<Envelope<R>, CrudError> {
        let mut resources = R::load_relations(tx, entities, relations).await?;
        guard_relations_for_collection(&mut resources, relations);
        Ok(Envelope::plain(resources))
    }
}
