use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, TransactionTrait,
};
use serde_json::Value;

use crate::entity::bookmark::{ActiveModel, Column, Entity as Bookmark, Model};
use crate::entity::list::Entity as List;
use crate::remote::{BookmarkRecord, is_link, to_bookmark_record};

use super::errors::{ReconcileError, Result};
use super::{ID_CHUNK_SIZE, ReconcileStats, dedup_last_wins};

/// Make the cached bookmarks of one list equal the remote's.
///
/// Only link records (or records without a content marker) participate.
/// With `modified_since` set, a record already cached in this list whose
/// modified time is not after the watermark is left untouched and counts as
/// seen. Every other record is upserted with `last_synced` stamped to now;
/// a record cached under another list moves here. Cached bookmarks of this
/// list the remote did not report are deleted.
///
/// The stored `modified_at` never moves backward.
///
/// # Errors
/// Returns `ReconcileError::UnknownList` if `list_id` is not cached and
/// `ReconcileError::Database` if any statement fails. Nothing is committed
/// in either case.
pub async fn reconcile_bookmarks_for_list(
    db: &DatabaseConnection,
    list_id: &str,
    records: &[Value],
    modified_since: Option<DateTime<Utc>>,
) -> Result<ReconcileStats> {
    let now = Utc::now();

    let converted = records.iter().filter(|r| is_link(r)).filter_map(|r| {
        let record = to_bookmark_record(r, now);
        if record.is_none() {
            tracing::warn!(list_id, "Skipping bookmark record without an id");
        }
        record
    });
    let incoming = dedup_last_wins(converted, |b| b.id.clone());

    // Dropping the transaction on error rolls it back.
    let txn = db.begin().await?;
    let stats = apply(&txn, list_id, &incoming, modified_since, now).await?;
    txn.commit().await?;

    tracing::debug!(
        list_id,
        inserted = stats.inserted,
        updated = stats.updated,
        unchanged = stats.unchanged,
        skipped = stats.skipped,
        deleted = stats.deleted,
        "Reconciled bookmarks"
    );

    Ok(stats)
}

async fn apply(
    txn: &DatabaseTransaction,
    list_id: &str,
    incoming: &[BookmarkRecord],
    modified_since: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<ReconcileStats> {
    if List::find_by_id(list_id.to_string()).one(txn).await?.is_none() {
        return Err(ReconcileError::UnknownList {
            list_id: list_id.to_string(),
        });
    }

    let mut existing: HashMap<String, Model> = Bookmark::find()
        .filter(Column::ListId.eq(list_id))
        .all(txn)
        .await?
        .into_iter()
        .map(|m| (m.id.clone(), m))
        .collect();

    let elsewhere = cached_in_other_lists(txn, incoming, &existing).await?;

    let mut stats = ReconcileStats::default();

    for record in incoming {
        if let Some(watermark) = modified_since
            && record.modified_at <= watermark
            && existing.remove(&record.id).is_some()
        {
            stats.skipped += 1;
            continue;
        }

        let previous = existing
            .remove(&record.id)
            .or_else(|| elsewhere.get(&record.id).cloned());
        let incoming_model = to_model(list_id, record, previous.as_ref(), now);

        match previous {
            Some(old) => {
                if old.list_id != list_id {
                    tracing::debug!(
                        bookmark_id = %record.id,
                        from = %old.list_id,
                        to = list_id,
                        "Moving bookmark between lists"
                    );
                }
                if old.same_content(&incoming_model) {
                    stats.unchanged += 1;
                } else {
                    stats.updated += 1;
                }
                Bookmark::update_many()
                    .set(to_active_model(&incoming_model))
                    .filter(Column::Id.eq(record.id.clone()))
                    .exec(txn)
                    .await?;
            }
            None => {
                Bookmark::insert(to_active_model(&incoming_model))
                    .exec_without_returning(txn)
                    .await?;
                stats.inserted += 1;
            }
        }
    }

    if !existing.is_empty() {
        let mut stale: Vec<String> = existing.into_keys().collect();
        stale.sort();

        for bookmark_id in &stale {
            tracing::info!(
                bookmark_id = %bookmark_id,
                list_id,
                "Deleting bookmark no longer in list"
            );
        }

        for chunk in stale.chunks(ID_CHUNK_SIZE) {
            let result = Bookmark::delete_many()
                .filter(Column::ListId.eq(list_id))
                .filter(Column::Id.is_in(chunk.iter().cloned()))
                .exec(txn)
                .await?;
            stats.deleted += result.rows_affected as usize;
        }
    }

    Ok(stats)
}

/// Cached rows for incoming ids that currently belong to another list.
async fn cached_in_other_lists(
    txn: &DatabaseTransaction,
    incoming: &[BookmarkRecord],
    existing: &HashMap<String, Model>,
) -> Result<HashMap<String, Model>> {
    let ids: Vec<String> = incoming
        .iter()
        .filter(|r| !existing.contains_key(&r.id))
        .map(|r| r.id.clone())
        .collect();

    let mut found = HashMap::new();
    for chunk in ids.chunks(ID_CHUNK_SIZE) {
        let rows = Bookmark::find()
            .filter(Column::Id.is_in(chunk.iter().cloned()))
            .all(txn)
            .await?;
        found.extend(rows.into_iter().map(|m| (m.id.clone(), m)));
    }

    Ok(found)
}

fn to_model(
    list_id: &str,
    record: &BookmarkRecord,
    previous: Option<&Model>,
    now: DateTime<Utc>,
) -> Model {
    let incoming = record.modified_at.fixed_offset();
    let modified_at = match previous {
        Some(old) if old.modified_at > incoming => old.modified_at,
        _ => incoming,
    };

    Model {
        id: record.id.clone(),
        list_id: list_id.to_string(),
        title: record.title.clone(),
        url: record.url.clone(),
        description: record.description.clone(),
        favicon: record.favicon.clone(),
        metadata: record.metadata.clone(),
        modified_at,
        last_synced: now.fixed_offset(),
    }
}

fn to_active_model(model: &Model) -> ActiveModel {
    ActiveModel {
        id: Set(model.id.clone()),
        list_id: Set(model.list_id.clone()),
        title: Set(model.title.clone()),
        url: Set(model.url.clone()),
        description: Set(model.description.clone()),
        favicon: Set(model.favicon.clone()),
        metadata: Set(model.metadata.clone()),
        modified_at: Set(model.modified_at),
        last_synced: Set(model.last_synced),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
    }

    fn record(id: &str, modified: DateTime<Utc>) -> BookmarkRecord {
        BookmarkRecord {
            id: id.to_string(),
            title: Some("Title".to_string()),
            url: "https://example.com".to_string(),
            description: String::new(),
            favicon: String::new(),
            metadata: json!({"link_title": "", "original_data": {"id": id}}),
            modified_at: modified,
        }
    }

    #[test]
    fn test_to_model_never_moves_modified_at_backward() {
        let newer = to_model("L1", &record("B1", at(10)), None, at(12));
        let older = record("B1", at(8));

        let model = to_model("L1", &older, Some(&newer), at(12));
        assert_eq!(model.modified_at, at(10).fixed_offset());

        let model = to_model("L1", &record("B1", at(11)), Some(&newer), at(12));
        assert_eq!(model.modified_at, at(11).fixed_offset());
    }

    #[test]
    fn test_to_model_stamps_last_synced_and_list() {
        let model = to_model("L2", &record("B1", at(8)), None, at(12));
        assert_eq!(model.list_id, "L2");
        assert_eq!(model.last_synced, at(12).fixed_offset());
        assert_eq!(model.title.as_deref(), Some("Title"));
    }

    #[test]
    fn test_to_active_model_sets_every_column() {
        let model = to_model("L1", &record("B1", at(8)), None, at(12));
        let am = to_active_model(&model);
        assert_eq!(am.id, Set("B1".to_string()));
        assert_eq!(am.list_id, Set("L1".to_string()));
        assert_eq!(am.modified_at, Set(at(8).fixed_offset()));
    }
}
