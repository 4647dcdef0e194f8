use async_trait::async_trait;
use chrono::Utc;
use crudion::errors::CrudError;
use crudion::filtering::parse_filter_with;
use crudion::query::compile_filter_with;
use crudion::relations::RelationRequest;
use crudion::traits::{CrudResource, MergeIntoActiveModel};
use sea_orm::{ConnectionTrait, QueryOrder, QuerySelect, Set, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod posts {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "posts")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub title: String,
        pub views: i64,
        pub published: bool,
        pub created_at: DateTimeUtc,
        pub deleted_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::tags::Entity")]
        Tags,
    }

    impl Related<super::tags::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Tags.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod tags {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "tags")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub post_id: Uuid,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::posts::Entity",
            from = "Column::PostId",
            to = "super::posts::Column::Id"
        )]
        Post,
    }

    impl Related<super::posts::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Post.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub views: i64,
    pub published: bool,
    pub created_at: chrono::DateTime<Utc>,
    pub deleted_at: Option<chrono::DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

impl From<posts::Model> for Post {
    fn from(model: posts::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            views: model.views,
            published: model.published,
            created_at: model.created_at,
            deleted_at: model.deleted_at,
            tags: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostCreate {
    pub title: String,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub published: bool,
}

impl From<PostCreate> for posts::ActiveModel {
    fn from(data: PostCreate) -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            title: Set(data.title),
            views: Set(data.views),
            published: Set(data.published),
            created_at: Set(Utc::now()),
            deleted_at: Set(None),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub views: Option<i64>,
    pub published: Option<bool>,
}

impl MergeIntoActiveModel<posts::ActiveModel> for PostUpdate {
    fn merge_into_activemodel(
        self,
        mut existing: posts::ActiveModel,
    ) -> Result<posts::ActiveModel, DbErr> {
        if let Some(title) = self.title {
            existing.title = Set(title);
        }
        if let Some(views) = self.views {
            existing.views = Set(views);
        }
        if let Some(published) = self.published {
            existing.published = Set(published);
        }
        Ok(existing)
    }
}

#[async_trait]
impl CrudResource for Post {
    type EntityType = posts::Entity;
    type ColumnType = posts::Column;
    type ActiveModelType = posts::ActiveModel;
    type CreateModel = PostCreate;
    type UpdateModel = PostUpdate;

    const ID_COLUMN: posts::Column = posts::Column::Id;
    const RESOURCE_NAME_SINGULAR: &str = "post";
    const RESOURCE_NAME_PLURAL: &str = "posts";

    fn filterable_columns() -> Vec<(&'static str, posts::Column)> {
        vec![
            ("title", posts::Column::Title),
            ("views", posts::Column::Views),
            ("published", posts::Column::Published),
            ("deleted_at", posts::Column::DeletedAt),
        ]
    }

    fn sortable_columns() -> Vec<(&'static str, posts::Column)> {
        vec![
            ("title", posts::Column::Title),
            ("views", posts::Column::Views),
            ("created_at", posts::Column::CreatedAt),
        ]
    }

    fn searchable_columns() -> Vec<(&'static str, posts::Column)> {
        vec![("title", posts::Column::Title)]
    }

    fn soft_delete_column() -> Option<posts::Column> {
        Some(posts::Column::DeletedAt)
    }

    fn allowed_relations() -> Vec<&'static str> {
        vec!["tags"]
    }

    async fn load_relations<C: ConnectionTrait>(
        db: &C,
        models: Vec<posts::Model>,
        requests: &[RelationRequest],
    ) -> Result<Vec<Self>, CrudError> {
        let tags_request = requests.iter().find(|r| r.is_for("tags"));
        let mut out = Vec::with_capacity(models.len());
        for model in models {
            let mut post = Post::from(model);
            if let Some(request) = tags_request {
                let mut query = tags::Entity::find()
                    .filter(tags::Column::PostId.eq(post.id))
                    .order_by_asc(tags::Column::Name);
                if let Some(raw) = request.filters.as_ref() {
                    let node = parse_filter_with(raw, &["name"], 1)?;
                    query = query
                        .filter(compile_filter_with(&[("name", tags::Column::Name)], &node)?);
                }
                if let Some(limit) = request.limit {
                    query = query.limit(limit);
                }
                let loaded = query.all(db).await?;
                post.tags = Some(loaded.into_iter().map(Tag::from).collect());
            }
            out.push(post);
        }
        Ok(out)
    }

    fn guard_relations(&mut self, requests: &[RelationRequest]) {
        if !requests.iter().any(|r| r.is_for("tags")) {
            self.tags = None;
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    pub id: Uuid,
    pub post_id: Uuid,
    pub name: String,
}

impl From<tags::Model> for Tag {
    fn from(model: tags::Model) -> Self {
        Self {
            id: model.id,
            post_id: model.post_id,
            name: model.name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagCreate {
    pub post_id: Uuid,
    pub name: String,
}

impl From<TagCreate> for tags::ActiveModel {
    fn from(data: TagCreate) -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            post_id: Set(data.post_id),
            name: Set(data.name),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagUpdate {
    pub name: Option<String>,
}

impl MergeIntoActiveModel<tags::ActiveModel> for TagUpdate {
    fn merge_into_activemodel(
        self,
        mut existing: tags::ActiveModel,
    ) -> Result<tags::ActiveModel, DbErr> {
        if let Some(name) = self.name {
            existing.name = Set(name);
        }
        Ok(existing)
    }
}

/// Tag exposed directly, without soft deletes. Destroys are permanent.
#[async_trait]
impl CrudResource for Tag {
    type EntityType = tags::Entity;
    type ColumnType = tags::Column;
    type ActiveModelType = tags::ActiveModel;
    type CreateModel = TagCreate;
    type UpdateModel = TagUpdate;

    const ID_COLUMN: tags::Column = tags::Column::Id;
    const RESOURCE_NAME_SINGULAR: &str = "tag";
    const RESOURCE_NAME_PLURAL: &str = "tags";

    fn filterable_columns() -> Vec<(&'static str, tags::Column)> {
        vec![("name", tags::Column::Name), ("post_id", tags::Column::PostId)]
    }

    fn sortable_columns() -> Vec<(&'static str, tags::Column)> {
        vec![("name", tags::Column::Name)]
    }

    fn searchable_columns() -> Vec<(&'static str, tags::Column)> {
        vec![("name", tags::Column::Name)]
    }
}
