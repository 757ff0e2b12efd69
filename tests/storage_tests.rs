//! Storage layer tests
//!
//! SeaORM storage against a temporary SQLite database: link inserts and
//! lookups, hit recording, and the raw aggregate queries.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};
use tempfile::TempDir;

use linktracker::errors::LinkTrackerError;
use linktracker::storage::backend::SeaOrmStorage;
use linktracker::storage::{EntityRef, HitFilter, LinkType, NewTrackedLink, Source};
use migration::entities::tracked_link;

// =============================================================================
// Test Setup
// =============================================================================

async fn setup() -> (TempDir, Arc<SeaOrmStorage>) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("storage_test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let storage = SeaOrmStorage::new(&db_url, "sqlite")
        .await
        .expect("Failed to create storage");
    (temp_dir, Arc::new(storage))
}

fn newsletter() -> EntityRef {
    EntityRef::new("newsletter", 1)
}

// =============================================================================
// Links
// =============================================================================

#[tokio::test]
async fn test_insert_and_find_by_slug() {
    let (_dir, storage) = setup().await;

    let request = NewTrackedLink::new("https://example.com/a", Source::entity("post", 9))
        .with_type(LinkType::DirectDownload)
        .with_observer(Some(newsletter()));
    let created = storage.insert_link(&request, "abc123").await.unwrap();

    assert_eq!(created.slug, "abc123");
    assert_eq!(created.link_type, LinkType::DirectDownload);

    let found = storage.find_by_slug("abc123").await.unwrap().unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.destination, "https://example.com/a");
    assert_eq!(found.source, Source::entity("post", 9));
    assert_eq!(found.observer, Some(newsletter()));
}

#[tokio::test]
async fn test_slug_lookup_is_case_sensitive() {
    let (_dir, storage) = setup().await;

    storage
        .insert_link(&NewTrackedLink::new("/x", Source::label("web")), "AbC")
        .await
        .unwrap();

    assert!(storage.find_by_slug("AbC").await.unwrap().is_some());
    assert!(storage.find_by_slug("abc").await.unwrap().is_none());
    assert!(storage.find_by_slug("ABC").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_slug_is_slug_taken() {
    let (_dir, storage) = setup().await;
    let request = NewTrackedLink::new("/x", Source::label("web"));

    storage.insert_link(&request, "dup").await.unwrap();
    let err = storage.insert_link(&request, "dup").await.unwrap_err();
    assert!(matches!(err, LinkTrackerError::SlugTaken(_)), "{:?}", err);

    assert!(storage.slug_exists("dup").await.unwrap());
    assert!(!storage.slug_exists("other").await.unwrap());
}

#[tokio::test]
async fn test_label_source_round_trips_with_null_id() {
    let (_dir, storage) = setup().await;

    storage
        .insert_link(&NewTrackedLink::new("/x", Source::label("twitter")), "lbl")
        .await
        .unwrap();

    let found = storage.find_by_slug("lbl").await.unwrap().unwrap();
    assert_eq!(found.source, Source::label("twitter"));
    assert_eq!(found.observer, None);
}

#[tokio::test]
async fn test_unknown_link_type_is_not_resolvable() {
    let (_dir, storage) = setup().await;

    tracked_link::ActiveModel {
        slug: Set("weird".to_string()),
        link_type: Set("Teleport".to_string()),
        destination: Set("/x".to_string()),
        source_type: Set("web".to_string()),
        source_id: Set(None),
        observer_type: Set(None),
        observer_id: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(storage.get_db())
    .await
    .unwrap();

    assert!(storage.find_by_slug("weird").await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_observed_links_in_id_order() {
    let (_dir, storage) = setup().await;

    for (slug, observer) in [
        ("one", Some(newsletter())),
        ("two", None),
        ("three", Some(newsletter())),
        ("four", Some(EntityRef::new("newsletter", 2))),
    ] {
        let request = NewTrackedLink::new("/x", Source::label("web")).with_observer(observer);
        storage.insert_link(&request, slug).await.unwrap();
    }

    let slugs: Vec<_> = storage
        .list_observed_links(&newsletter())
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.slug)
        .collect();
    assert_eq!(slugs, ["one", "three"]);
}

// =============================================================================
// Hits
// =============================================================================

#[tokio::test]
async fn test_record_and_list_hits() {
    let (_dir, storage) = setup().await;
    let link = storage
        .insert_link(&NewTrackedLink::new("/x", Source::label("web")), "hits")
        .await
        .unwrap();

    let t1 = Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2026, 10, 1, 13, 0, 0).unwrap();
    storage.record_hit(link.id, "198.51.100.7", t2).await.unwrap();
    storage.record_hit(link.id, "198.51.100.8", t1).await.unwrap();

    let hits = storage.hits_for_link(link.id).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].created_at, t1);
    assert_eq!(hits[0].remote_address, "198.51.100.8");
    assert_eq!(storage.count_hits_for_link(link.id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_hit_for_deleted_link_is_not_found() {
    let (_dir, storage) = setup().await;
    let link = storage
        .insert_link(&NewTrackedLink::new("https://example.com/x", Source::label("web")), "gone")
        .await
        .unwrap();
    storage.record_hit(link.id, "a", Utc::now()).await.unwrap();

    tracked_link::Entity::delete_by_id(link.id)
        .exec(storage.get_db())
        .await
        .unwrap();

    let err = storage.record_hit(link.id, "b", Utc::now()).await.unwrap_err();
    assert!(matches!(err, LinkTrackerError::NotFound(_)), "{:?}", err);
    assert_eq!(storage.count_hits_for_link(link.id).await.unwrap(), 0);

    let err = storage.record_hit(987_654, "c", Utc::now()).await.unwrap_err();
    assert!(matches!(err, LinkTrackerError::NotFound(_)), "{:?}", err);
}

#[tokio::test]
async fn test_hit_filter_bounds_are_half_open() {
    let (_dir, storage) = setup().await;
    let link = storage
        .insert_link(
            &NewTrackedLink::new("/x", Source::label("web")).with_observer(Some(newsletter())),
            "range",
        )
        .await
        .unwrap();

    let t0 = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2026, 10, 1, 1, 0, 0).unwrap();
    storage.record_hit(link.id, "a", t0).await.unwrap();
    storage.record_hit(link.id, "b", t1).await.unwrap();

    let filter = HitFilter::between(t0, t1);
    assert_eq!(storage.count_hits(&newsletter(), &filter).await.unwrap(), 1);
    assert_eq!(
        storage.list_clicks(&newsletter(), &filter).await.unwrap()[0].remote_address,
        "a"
    );
}

#[tokio::test]
async fn test_clicks_only_count_redirect_links() {
    let (_dir, storage) = setup().await;
    let observer = newsletter();

    let redirect = storage
        .insert_link(
            &NewTrackedLink::new("/page", Source::label("web")).with_observer(Some(observer.clone())),
            "redir",
        )
        .await
        .unwrap();
    let image = storage
        .insert_link(
            &NewTrackedLink::new("https://cdn.example.com/p.png", Source::label("web"))
                .with_type(LinkType::DirectDownload)
                .with_observer(Some(observer.clone())),
            "pixel",
        )
        .await
        .unwrap();

    let now = Utc::now();
    storage.record_hit(redirect.id, "a", now).await.unwrap();
    storage.record_hit(image.id, "a", now).await.unwrap();
    storage.record_hit(image.id, "b", now).await.unwrap();

    let all = HitFilter::default();
    assert_eq!(storage.count_hits(&observer, &all).await.unwrap(), 3);
    assert_eq!(storage.count_clicks(&observer, &all).await.unwrap(), 1);
    // (address, source) 去重：a/web, b/web
    assert_eq!(storage.count_unique_hits(&observer, &all).await.unwrap(), 2);
}
