//! Integration tests for reconciliation against a real SQLite cache.
//!
//! Key properties tested:
//! - `reconcile_lists` is idempotent and leaves exactly the remote's ids
//! - Removing a list removes its bookmarks
//! - Bookmarks at or before the watermark are neither altered nor deleted
//! - A failing statement rolls the whole call back
//! - A bookmark's modified time never moves backward

#![cfg(all(feature = "sqlite", feature = "migrate"))]

use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};
use keepcache::connect_and_migrate;
use keepcache::entity::prelude::*;
use keepcache::reconcile::{ReconcileError, reconcile_bookmarks_for_list, reconcile_lists};
use keepcache::remote::RemoteList;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};
use serde_json::{Value, json};

async fn setup_test_db() -> DatabaseConnection {
    connect_and_migrate("sqlite::memory:")
        .await
        .expect("Failed to create test database")
}

fn remote_list(id: &str, name: &str, position: i64) -> RemoteList {
    RemoteList {
        id: id.to_string(),
        name: Some(name.to_string()),
        description: None,
        icon: None,
        parent_id: None,
        position: Some(position),
    }
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
}

fn bookmark(id: &str, title: &str, modified: DateTime<Utc>) -> Value {
    json!({
        "id": id,
        "title": title,
        "content": {"type": "link", "url": format!("https://example.com/{id}")},
        "modifiedAt": modified.to_rfc3339(),
    })
}

async fn list_ids(db: &DatabaseConnection) -> BTreeSet<String> {
    List::find()
        .all(db)
        .await
        .expect("query lists")
        .into_iter()
        .map(|l| l.id)
        .collect()
}

async fn bookmark_ids(db: &DatabaseConnection, list_id: &str) -> BTreeSet<String> {
    Bookmark::find()
        .filter(BookmarkColumn::ListId.eq(list_id))
        .all(db)
        .await
        .expect("query bookmarks")
        .into_iter()
        .map(|b| b.id)
        .collect()
}

async fn get_bookmark(db: &DatabaseConnection, id: &str) -> BookmarkModel {
    Bookmark::find_by_id(id.to_string())
        .one(db)
        .await
        .expect("query bookmark")
        .expect("bookmark should exist")
}

fn ids(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ─── Lists ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reconcile_lists_is_idempotent() {
    let db = setup_test_db().await;
    let remote = vec![remote_list("L1", "Reading", 0), remote_list("L2", "Tools", 1)];

    let first = reconcile_lists(&db, &remote).await.expect("first");
    assert_eq!(first.inserted, 2);
    let rows_after_first = List::find().all(&db).await.unwrap();

    let second = reconcile_lists(&db, &remote).await.expect("second");
    assert_eq!(second.inserted, 0);
    assert_eq!(second.updated, 0);
    assert_eq!(second.unchanged, 2);
    assert_eq!(second.deleted, 0);

    let rows_after_second = List::find().all(&db).await.unwrap();
    assert_eq!(rows_after_first.len(), rows_after_second.len());
    for (a, b) in rows_after_first.iter().zip(rows_after_second.iter()) {
        assert!(a.same_content(b), "{a:?} != {b:?}");
    }
}

#[tokio::test]
async fn test_reconcile_lists_matches_remote_ids_exactly() {
    let db = setup_test_db().await;
    reconcile_lists(
        &db,
        &[
            remote_list("L1", "One", 0),
            remote_list("L2", "Two", 1),
            remote_list("L3", "Three", 2),
        ],
    )
    .await
    .unwrap();

    let stats = reconcile_lists(&db, &[remote_list("L2", "Two v2", 5), remote_list("L4", "Four", 0)])
        .await
        .unwrap();

    assert_eq!(list_ids(&db).await, ids(&["L2", "L4"]));
    assert_eq!(stats.inserted, 1);
    assert_eq!(stats.updated, 1);
    assert_eq!(stats.deleted, 2);

    let l2 = List::find_by_id("L2".to_string()).one(&db).await.unwrap().unwrap();
    assert_eq!(l2.name, "Two v2");
    assert_eq!(l2.position, 5);
    assert_eq!(l2.icon, DEFAULT_ICON);
}

#[tokio::test]
async fn test_reconcile_lists_duplicate_ids_last_write_wins() {
    let db = setup_test_db().await;
    let stats = reconcile_lists(&db, &[remote_list("L1", "First", 0), remote_list("L1", "Second", 3)])
        .await
        .unwrap();

    assert_eq!(stats.inserted, 1);
    let rows = List::find().all(&db).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Second");
    assert_eq!(rows[0].position, 3);
}

#[tokio::test]
async fn test_removing_list_removes_its_bookmarks() {
    let db = setup_test_db().await;
    reconcile_lists(&db, &[remote_list("L1", "One", 0), remote_list("L2", "Two", 1)])
        .await
        .unwrap();
    reconcile_bookmarks_for_list(&db, "L1", &[bookmark("B1", "a", at(8)), bookmark("B2", "b", at(8))], None)
        .await
        .unwrap();
    reconcile_bookmarks_for_list(&db, "L2", &[bookmark("B3", "c", at(8))], None)
        .await
        .unwrap();

    reconcile_lists(&db, &[remote_list("L2", "Two", 1)]).await.unwrap();

    assert_eq!(list_ids(&db).await, ids(&["L2"]));
    assert!(bookmark_ids(&db, "L1").await.is_empty());
    assert_eq!(bookmark_ids(&db, "L2").await, ids(&["B3"]));
    assert_eq!(Bookmark::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_reconcile_lists_rolls_back_on_failure() {
    let db = setup_test_db().await;
    reconcile_lists(&db, &[remote_list("L1", "One", 0)]).await.unwrap();

    db.execute_unprepared(
        "CREATE TRIGGER reject_list BEFORE INSERT ON lists WHEN NEW.id = 'boom' \
         BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
    )
    .await
    .expect("create trigger");

    let err = reconcile_lists(
        &db,
        &[
            remote_list("L1", "Renamed", 0),
            remote_list("L2", "New", 1),
            remote_list("boom", "Fails", 2),
        ],
    )
    .await
    .expect_err("trigger should abort the insert");
    assert!(matches!(err, ReconcileError::Database(_)));

    assert_eq!(list_ids(&db).await, ids(&["L1"]));
    let l1 = List::find_by_id("L1".to_string()).one(&db).await.unwrap().unwrap();
    assert_eq!(l1.name, "One");
}

// ─── Bookmarks ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reconcile_bookmarks_replaces_list_contents() {
    let db = setup_test_db().await;
    reconcile_lists(&db, &[remote_list("L1", "One", 0)]).await.unwrap();
    reconcile_bookmarks_for_list(&db, "L1", &[bookmark("B1", "one", at(8))], None)
        .await
        .unwrap();

    let stats = reconcile_bookmarks_for_list(&db, "L1", &[bookmark("B2", "two", at(9))], None)
        .await
        .unwrap();

    assert_eq!(bookmark_ids(&db, "L1").await, ids(&["B2"]));
    assert_eq!(stats.inserted, 1);
    assert_eq!(stats.deleted, 1);
}

#[tokio::test]
async fn test_reconcile_bookmarks_is_idempotent() {
    let db = setup_test_db().await;
    reconcile_lists(&db, &[remote_list("L1", "One", 0)]).await.unwrap();
    let records = vec![bookmark("B1", "one", at(8)), bookmark("B2", "two", at(9))];

    reconcile_bookmarks_for_list(&db, "L1", &records, None).await.unwrap();
    let before = get_bookmark(&db, "B1").await;

    let stats = reconcile_bookmarks_for_list(&db, "L1", &records, None).await.unwrap();
    assert_eq!(stats.unchanged, 2);
    assert_eq!(stats.inserted + stats.updated + stats.deleted, 0);

    let after = get_bookmark(&db, "B1").await;
    assert!(before.same_content(&after));
    assert!(after.last_synced >= before.last_synced);
}

#[tokio::test]
async fn test_watermark_leaves_older_bookmarks_untouched() {
    let db = setup_test_db().await;
    reconcile_lists(&db, &[remote_list("L1", "One", 0)]).await.unwrap();
    reconcile_bookmarks_for_list(
        &db,
        "L1",
        &[bookmark("B1", "old", at(8)), bookmark("B2", "old", at(8))],
        None,
    )
    .await
    .unwrap();
    let b1_before = get_bookmark(&db, "B1").await;

    // B1 carries a changed title but a modified time before the watermark.
    let stats = reconcile_bookmarks_for_list(
        &db,
        "L1",
        &[bookmark("B1", "changed", at(8)), bookmark("B2", "changed", at(11))],
        Some(at(9)),
    )
    .await
    .unwrap();

    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.updated, 1);
    assert_eq!(stats.deleted, 0);

    let b1_after = get_bookmark(&db, "B1").await;
    assert_eq!(b1_after, b1_before);
    assert_eq!(get_bookmark(&db, "B2").await.title.as_deref(), Some("changed"));
}

#[tokio::test]
async fn test_watermark_equal_time_is_not_after() {
    let db = setup_test_db().await;
    reconcile_lists(&db, &[remote_list("L1", "One", 0)]).await.unwrap();
    reconcile_bookmarks_for_list(&db, "L1", &[bookmark("B1", "old", at(9))], None)
        .await
        .unwrap();

    let stats = reconcile_bookmarks_for_list(&db, "L1", &[bookmark("B1", "new", at(9))], Some(at(9)))
        .await
        .unwrap();

    assert_eq!(stats.skipped, 1);
    assert_eq!(get_bookmark(&db, "B1").await.title.as_deref(), Some("old"));
}

#[tokio::test]
async fn test_watermark_still_deletes_unreported_and_inserts_uncached() {
    let db = setup_test_db().await;
    reconcile_lists(&db, &[remote_list("L1", "One", 0)]).await.unwrap();
    reconcile_bookmarks_for_list(
        &db,
        "L1",
        &[bookmark("B1", "keep", at(8)), bookmark("B3", "gone", at(8))],
        None,
    )
    .await
    .unwrap();

    // B4 predates the watermark but is not cached yet, so it is written.
    let stats = reconcile_bookmarks_for_list(
        &db,
        "L1",
        &[bookmark("B1", "keep", at(8)), bookmark("B4", "late", at(7))],
        Some(at(9)),
    )
    .await
    .unwrap();

    assert_eq!(bookmark_ids(&db, "L1").await, ids(&["B1", "B4"]));
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.inserted, 1);
    assert_eq!(stats.deleted, 1);
}

#[tokio::test]
async fn test_modified_at_never_moves_backward() {
    let db = setup_test_db().await;
    reconcile_lists(&db, &[remote_list("L1", "One", 0)]).await.unwrap();
    reconcile_bookmarks_for_list(&db, "L1", &[bookmark("B1", "v1", at(10))], None)
        .await
        .unwrap();

    reconcile_bookmarks_for_list(&db, "L1", &[bookmark("B1", "v2", at(8))], None)
        .await
        .unwrap();

    let b1 = get_bookmark(&db, "B1").await;
    assert_eq!(b1.title.as_deref(), Some("v2"));
    assert_eq!(b1.modified_at, at(10).fixed_offset());
}

#[tokio::test]
async fn test_reconcile_bookmarks_rolls_back_on_failure() {
    let db = setup_test_db().await;
    reconcile_lists(&db, &[remote_list("L1", "One", 0)]).await.unwrap();
    reconcile_bookmarks_for_list(
        &db,
        "L1",
        &[bookmark("B1", "v1", at(8)), bookmark("B2", "v1", at(8))],
        None,
    )
    .await
    .unwrap();
    let before: Vec<BookmarkModel> = Bookmark::find().all(&db).await.unwrap();

    db.execute_unprepared(
        "CREATE TRIGGER reject_bookmark BEFORE INSERT ON bookmarks WHEN NEW.id = 'boom' \
         BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
    )
    .await
    .expect("create trigger");

    // B1 is updated and B3 inserted before the failing insert.
    let err = reconcile_bookmarks_for_list(
        &db,
        "L1",
        &[
            bookmark("B1", "v2", at(9)),
            bookmark("B3", "new", at(9)),
            bookmark("boom", "fails", at(9)),
        ],
        None,
    )
    .await
    .expect_err("trigger should abort the insert");
    assert!(matches!(err, ReconcileError::Database(_)));

    let after: Vec<BookmarkModel> = Bookmark::find().all(&db).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_reconcile_bookmarks_for_unknown_list_fails() {
    let db = setup_test_db().await;

    let err = reconcile_bookmarks_for_list(&db, "missing", &[bookmark("B1", "x", at(8))], None)
        .await
        .expect_err("unknown list");
    assert!(matches!(err, ReconcileError::UnknownList { ref list_id } if list_id == "missing"));
    assert_eq!(Bookmark::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_non_link_records_are_ignored() {
    let db = setup_test_db().await;
    reconcile_lists(&db, &[remote_list("L1", "One", 0)]).await.unwrap();

    let records = vec![
        bookmark("B1", "link", at(8)),
        json!({"id": "N1", "content": {"type": "text", "text": "a note"}}),
        json!({"id": "A1", "content": {"type": "asset", "assetId": "x"}}),
        json!({"id": "P1", "title": "plain", "url": "https://plain.example"}),
        json!({"title": "no id"}),
    ];

    reconcile_bookmarks_for_list(&db, "L1", &records, None).await.unwrap();
    assert_eq!(bookmark_ids(&db, "L1").await, ids(&["B1", "P1"]));

    let plain = get_bookmark(&db, "P1").await;
    assert_eq!(plain.url, "https://plain.example");
    assert_eq!(plain.metadata["original_data"]["title"], "plain");
}

#[tokio::test]
async fn test_bookmark_moves_between_lists() {
    let db = setup_test_db().await;
    reconcile_lists(&db, &[remote_list("L1", "One", 0), remote_list("L2", "Two", 1)])
        .await
        .unwrap();
    reconcile_bookmarks_for_list(&db, "L1", &[bookmark("B1", "moving", at(8))], None)
        .await
        .unwrap();

    reconcile_bookmarks_for_list(&db, "L1", &[], None).await.unwrap();
    reconcile_bookmarks_for_list(&db, "L2", &[bookmark("B1", "moving", at(9))], None)
        .await
        .unwrap();

    assert!(bookmark_ids(&db, "L1").await.is_empty());
    assert_eq!(bookmark_ids(&db, "L2").await, ids(&["B1"]));

    // Reported by the new list before the old list stopped reporting it.
    reconcile_bookmarks_for_list(&db, "L1", &[bookmark("B2", "other", at(8))], None)
        .await
        .unwrap();
    let stats = reconcile_bookmarks_for_list(&db, "L1", &[bookmark("B2", "other", at(8)), bookmark("B1", "back", at(10))], None)
        .await
        .unwrap();
    assert_eq!(stats.updated, 1);
    assert_eq!(get_bookmark(&db, "B1").await.list_id, "L1");
    assert_eq!(Bookmark::find().count(&db).await.unwrap(), 2);
}
