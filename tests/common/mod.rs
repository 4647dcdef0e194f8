use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::prelude::*;

pub mod post_entity;

#[allow(dead_code)]
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreatePostTable), Box::new(CreateTagTable)]
    }
}

pub struct CreatePostTable;

impl MigrationName for CreatePostTable {
    fn name(&self) -> &'static str {
        "m20250101_000001_create_post_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreatePostTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(PostTable)
            .if_not_exists()
            .col(
                ColumnDef::new(PostColumn::Id)
                    .uuid()
                    .not_null()
                    .primary_key(),
            )
            .col(
                ColumnDef::new(PostColumn::Title)
                    .text()
                    .not_null()
                    .unique_key(),
            )
            .col(
                ColumnDef::new(PostColumn::Views)
                    .big_integer()
                    .not_null()
                    .default(0),
            )
            .col(
                ColumnDef::new(PostColumn::Published)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .col(
                ColumnDef::new(PostColumn::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .col(ColumnDef::new(PostColumn::DeletedAt).timestamp_with_time_zone())
            .to_owned();
        manager.create_table(table).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostTable).to_owned())
            .await
    }
}

pub struct CreateTagTable;

impl MigrationName for CreateTagTable {
    fn name(&self) -> &'static str {
        "m20250101_000002_create_tag_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateTagTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(TagTable)
            .if_not_exists()
            .col(
                ColumnDef::new(TagColumn::Id)
                    .uuid()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(TagColumn::PostId).uuid().not_null())
            .col(ColumnDef::new(TagColumn::Name).text().not_null())
            .to_owned();
        manager.create_table(table).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TagTable).to_owned())
            .await
    }
}

#[derive(Debug)]
pub enum PostColumn {
    Id,
    Title,
    Views,
    Published,
    CreatedAt,
    DeletedAt,
}

impl Iden for PostColumn {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(
            s,
            "{}",
            match self {
                Self::Id => "id",
                Self::Title => "title",
                Self::Views => "views",
                Self::Published => "published",
                Self::CreatedAt => "created_at",
                Self::DeletedAt => "deleted_at",
            }
        )
        .unwrap();
    }
}

#[derive(Debug)]
pub struct PostTable;

impl Iden for PostTable {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "posts").unwrap();
    }
}

#[derive(Debug)]
pub enum TagColumn {
    Id,
    PostId,
    Name,
}

impl Iden for TagColumn {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(
            s,
            "{}",
            match self {
                Self::Id => "id",
                Self::PostId => "post_id",
                Self::Name => "name",
            }
        )
        .unwrap();
    }
}

#[derive(Debug)]
pub struct TagTable;

impl Iden for TagTable {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "tags").unwrap();
    }
}
