use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ConnectionTrait, EntityTrait, IntoActiveModel, Value, entity::prelude::*,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::errors::CrudError;
use crate::query::TrashedScope;
use crate::query::compile::apply_trashed_scope;
use crate::relations::RelationRequest;

pub trait MergeIntoActiveModel<ActiveModelType> {
    /// Merge this partial update into an existing active model, leaving
    /// absent fields untouched.
    ///
    /// # Errors
    ///
    /// Returns a `DbErr` if a field fails data conversion.
    fn merge_into_activemodel(self, existing: ActiveModelType) -> Result<ActiveModelType, DbErr>;
}

/// The contract a REST-exposed resource implements once; every endpoint,
/// query, and batch operation is derived from it at registration time.
///
/// All persistence methods are generic over [`ConnectionTrait`] so they run
/// equally on a pooled connection or an open transaction; batch operations
/// rely on this to make their re-fetches observe uncommitted writes.
#[async_trait]
pub trait CrudResource: Sized + Send + Sync + Serialize
where
    Self::EntityType: EntityTrait<Column = Self::ColumnType> + Sync,
    Self::ActiveModelType:
        ActiveModelTrait<Entity = Self::EntityType> + ActiveModelBehavior + Send + Sync,
    <Self::EntityType as EntityTrait>::Model:
        Sync + Clone + IntoActiveModel<Self::ActiveModelType>,
    <<Self::EntityType as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
    <<Self::EntityType as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType: Into<Uuid>,
    Self: From<<Self::EntityType as EntityTrait>::Model>,
{
    type EntityType: EntityTrait + Sync;
    type ColumnType: ColumnTrait + std::fmt::Debug;
    type ActiveModelType: ActiveModelTrait<Entity = Self::EntityType>;
    type CreateModel: Into<Self::ActiveModelType> + DeserializeOwned + Send + Sync;
    type UpdateModel: MergeIntoActiveModel<Self::ActiveModelType> + DeserializeOwned + Send + Sync;

    const ID_COLUMN: Self::ColumnType;
    const RESOURCE_NAME_SINGULAR: &str;
    const RESOURCE_NAME_PLURAL: &str;

    /// Fields clients may reference in filter trees.
    fn filterable_columns() -> Vec<(&'static str, Self::ColumnType)>;

    /// Fields clients may sort by.
    fn sortable_columns() -> Vec<(&'static str, Self::ColumnType)>;

    /// Fields free-text search matches against. Empty disables search.
    fn searchable_columns() -> Vec<(&'static str, Self::ColumnType)> {
        vec![]
    }

    /// The timestamp column marking soft deletion, if the resource is
    /// soft-deletable. `None` makes every destroy permanent.
    fn soft_delete_column() -> Option<Self::ColumnType> {
        None
    }

    /// Relation paths clients may request via `include`. A trailing `.*`
    /// segment whitelists everything below that prefix up to the
    /// configured depth.
    fn allowed_relations() -> Vec<&'static str> {
        vec![]
    }

    /// Extract the key from a fetched model.
    fn key_of(model: &<Self::EntityType as EntityTrait>::Model) -> Result<Uuid, DbErr> {
        match model.get(Self::ID_COLUMN) {
            Value::Uuid(Some(id)) => Ok(*id),
            other => Err(DbErr::Type(format!(
                "{} key column did not yield a UUID: {other:?}",
                Self::RESOURCE_NAME_SINGULAR
            ))),
        }
    }

    async fn fetch_by_key<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        scope: TrashedScope,
    ) -> Result<<Self::EntityType as EntityTrait>::Model, DbErr> {
        apply_trashed_scope::<Self>(
            Self::EntityType::find().filter(Self::ID_COLUMN.eq(id)),
            scope,
        )
        .one(db)
        .await?
        .ok_or(DbErr::RecordNotFound(format!(
            "{} not found",
            Self::RESOURCE_NAME_SINGULAR
        )))
    }

    async fn create<C: ConnectionTrait>(
        db: &C,
        create_model: Self::CreateModel,
    ) -> Result<<Self::EntityType as EntityTrait>::Model, DbErr> {
        let active_model: Self::ActiveModelType = create_model.into();
        // insert returns the model directly, which works across all
        // databases unlike last_insert_id for UUID keys
        active_model.insert(db).await
    }

    async fn update<C: ConnectionTrait>(
        db: &C,
        model: <Self::EntityType as EntityTrait>::Model,
        update_model: Self::UpdateModel,
    ) -> Result<<Self::EntityType as EntityTrait>::Model, DbErr> {
        let existing: Self::ActiveModelType = model.into_active_model();
        let merged = update_model.merge_into_activemodel(existing)?;
        merged.update(db).await
    }

    /// Permanent row removal.
    async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), DbErr> {
        let res = Self::EntityType::delete_by_id(id).exec(db).await?;
        match res.rows_affected {
            0 => Err(DbErr::RecordNotFound(format!(
                "{} not found",
                Self::RESOURCE_NAME_SINGULAR
            ))),
            _ => Ok(()),
        }
    }

    /// Stamp the soft-delete column instead of removing the row.
    async fn soft_delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), DbErr> {
        let column = Self::soft_delete_column().ok_or_else(|| {
            DbErr::Custom(format!(
                "{} does not support soft deletes",
                Self::RESOURCE_NAME_SINGULAR
            ))
        })?;
        let res = Self::EntityType::update_many()
            .col_expr(column, Expr::value(Utc::now()))
            .filter(Self::ID_COLUMN.eq(id))
            .exec(db)
            .await?;
        match res.rows_affected {
            0 => Err(DbErr::RecordNotFound(format!(
                "{} not found",
                Self::RESOURCE_NAME_SINGULAR
            ))),
            _ => Ok(()),
        }
    }

    /// Clear the soft-delete column on a trashed row.
    async fn restore<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), DbErr> {
        let column = Self::soft_delete_column().ok_or_else(|| {
            DbErr::Custom(format!(
                "{} does not support soft deletes",
                Self::RESOURCE_NAME_SINGULAR
            ))
        })?;
        let res = Self::EntityType::update_many()
            .col_expr(column, Expr::value(Value::ChronoDateTimeUtc(None)))
            .filter(Self::ID_COLUMN.eq(id))
            .exec(db)
            .await?;
        match res.rows_affected {
            0 => Err(DbErr::RecordNotFound(format!(
                "{} not found",
                Self::RESOURCE_NAME_SINGULAR
            ))),
            _ => Ok(()),
        }
    }

    /// Convert fetched models into API representations, attaching the
    /// requested relations. The default attaches nothing; resources with
    /// relations override this and load them with their own entity types.
    async fn load_relations<C: ConnectionTrait>(
        db: &C,
        models: Vec<<Self::EntityType as EntityTrait>::Model>,
        requests: &[RelationRequest],
    ) -> Result<Vec<Self>, CrudError> {
        let _ = (db, requests);
        Ok(models.into_iter().map(Self::from).collect())
    }

    /// Strip any relation payload the client did not ask for. Called on
    /// every representation leaving a collection response, whichever
    /// operation produced it.
    fn guard_relations(&mut self, requests: &[RelationRequest]) {
        let _ = requests;
    }
}
