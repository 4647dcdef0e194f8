mod common;

use common::post_entity::{Post, PostCreate};
use common::setup_test_db;
use crudion::config::CrudConfig;
use crudion::models::{BatchStore, ListParams};
use crudion::operations::CrudContext;

async fn context_with_posts(count: usize) -> CrudContext<Post> {
    let db = setup_test_db().await.unwrap();
    let ctx: CrudContext<Post> = CrudContext::new(db);
    let resources = (1..=count)
        .map(|n| PostCreate {
            title: format!("post {n:03}"),
            views: n as i64,
            published: true,
        })
        .collect();
    ctx.batch_store(&ListParams::default(), BatchStore { resources })
        .await
        .unwrap();
    ctx
}

#[tokio::test]
async fn meta_reflects_the_requested_window() {
    let ctx = context_with_posts(45).await;

    let envelope = ctx
        .list(&ListParams {
            page: Some(2),
            limit: Some(15),
            sort: Some("title:asc".to_string()),
            ..ListParams::default()
        })
        .await
        .unwrap();

    assert_eq!(envelope.data.len(), 15);
    assert_eq!(envelope.data[0].title, "post 016");

    let meta = envelope.meta.unwrap();
    assert_eq!(meta.current_page, 2);
    assert_eq!(meta.from, Some(16));
    assert_eq!(meta.to, Some(30));
    assert_eq!(meta.last_page, 3);
    assert_eq!(meta.per_page, 15);
    assert_eq!(meta.total, 45);

    let links = envelope.links.unwrap();
    assert_eq!(links.first, "/posts?page=1&limit=15");
    assert_eq!(links.last, "/posts?page=3&limit=15");
    assert_eq!(links.prev.as_deref(), Some("/posts?page=1&limit=15"));
    assert_eq!(links.next.as_deref(), Some("/posts?page=3&limit=15"));
}

#[tokio::test]
async fn default_limit_applies_when_absent() {
    let ctx = context_with_posts(25).await;

    let envelope = ctx.list(&ListParams::default()).await.unwrap();

    assert_eq!(envelope.data.len(), 10);
    let meta = envelope.meta.unwrap();
    assert_eq!(meta.per_page, 10);
    assert_eq!(meta.last_page, 3);
    assert_eq!(meta.total, 25);
}

#[tokio::test]
async fn limit_zero_returns_everything_without_meta() {
    let ctx = context_with_posts(12).await;

    let envelope = ctx
        .list(&ListParams {
            limit: Some(0),
            ..ListParams::default()
        })
        .await
        .unwrap();

    assert_eq!(envelope.data.len(), 12);
    assert!(envelope.meta.is_none());
    assert!(envelope.links.is_none());
}

#[tokio::test]
async fn disabled_pagination_config_drops_meta_for_every_call() {
    let db = setup_test_db().await.unwrap();
    let config: CrudConfig = serde_json::from_str(r#"{"pagination": {"disabled": true}}"#).unwrap();
    let ctx: CrudContext<Post> = CrudContext::new(db).with_config(config);

    let resources = (1..=7)
        .map(|n| PostCreate {
            title: format!("post {n}"),
            views: 0,
            published: false,
        })
        .collect();
    ctx.batch_store(&ListParams::default(), BatchStore { resources })
        .await
        .unwrap();

    let envelope = ctx
        .list(&ListParams {
            page: Some(2),
            limit: Some(3),
            ..ListParams::default()
        })
        .await
        .unwrap();

    assert_eq!(envelope.data.len(), 7);
    assert!(envelope.meta.is_none());
}

#[tokio::test]
async fn page_past_the_end_is_empty_with_no_window() {
    let ctx = context_with_posts(5).await;

    let envelope = ctx
        .list(&ListParams {
            page: Some(9),
            limit: Some(10),
            ..ListParams::default()
        })
        .await
        .unwrap();

    assert!(envelope.data.is_empty());
    let meta = envelope.meta.unwrap();
    assert_eq!(meta.current_page, 9);
    assert_eq!(meta.from, None);
    assert_eq!(meta.to, None);
    assert_eq!(meta.total, 5);
    assert_eq!(meta.last_page, 1);
}
