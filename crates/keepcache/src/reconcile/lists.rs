use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, TransactionTrait,
};

use crate::entity::bookmark::{Column as BookmarkColumn, Entity as Bookmark};
use crate::entity::list::{ActiveModel, Column, Entity as List, Model};
use crate::remote::RemoteList;

use super::errors::Result;
use super::{ID_CHUNK_SIZE, ReconcileStats, dedup_last_wins};

/// Make the cached lists equal the remote's.
///
/// Known lists get every mutable field overwritten, unknown ones are
/// inserted, and cached lists the remote no longer reports are deleted
/// together with their bookmarks. Duplicate ids in `remote` collapse to the
/// last occurrence.
///
/// # Errors
/// Returns `ReconcileError::Database` if any statement fails; nothing is
/// committed in that case.
pub async fn reconcile_lists(
    db: &DatabaseConnection,
    remote: &[RemoteList],
) -> Result<ReconcileStats> {
    let remote = dedup_last_wins(remote.iter(), |l| l.id.clone());
    let now = Utc::now();

    // Dropping the transaction on error rolls it back.
    let txn = db.begin().await?;
    let stats = apply(&txn, &remote, now).await?;
    txn.commit().await?;

    tracing::info!(
        count = remote.len(),
        inserted = stats.inserted,
        updated = stats.updated,
        unchanged = stats.unchanged,
        deleted = stats.deleted,
        "Reconciled lists"
    );

    Ok(stats)
}

async fn apply(
    txn: &DatabaseTransaction,
    remote: &[&RemoteList],
    now: DateTime<Utc>,
) -> Result<ReconcileStats> {
    let mut existing: HashMap<String, Model> = List::find()
        .all(txn)
        .await?
        .into_iter()
        .map(|m| (m.id.clone(), m))
        .collect();

    let mut stats = ReconcileStats::default();

    for list in remote {
        let incoming = to_model(list, now);

        match existing.remove(&incoming.id) {
            Some(old) => {
                if old.same_content(&incoming) {
                    stats.unchanged += 1;
                } else {
                    stats.updated += 1;
                }
                List::update_many()
                    .set(to_active_model(&incoming))
                    .filter(Column::Id.eq(incoming.id.clone()))
                    .exec(txn)
                    .await?;
            }
            None => {
                List::insert(to_active_model(&incoming))
                    .exec_without_returning(txn)
                    .await?;
                stats.inserted += 1;
            }
        }
    }

    if !existing.is_empty() {
        let mut stale: Vec<String> = existing.into_keys().collect();
        stale.sort();

        for list_id in &stale {
            tracing::info!(list_id = %list_id, "Deleting list no longer reported by remote");
        }

        for chunk in stale.chunks(ID_CHUNK_SIZE) {
            // ON DELETE CASCADE only fires on connections with foreign_keys=ON.
            Bookmark::delete_many()
                .filter(BookmarkColumn::ListId.is_in(chunk.iter().cloned()))
                .exec(txn)
                .await?;

            let result = List::delete_many()
                .filter(Column::Id.is_in(chunk.iter().cloned()))
                .exec(txn)
                .await?;
            stats.deleted += result.rows_affected as usize;
        }
    }

    Ok(stats)
}

fn to_model(list: &RemoteList, now: DateTime<Utc>) -> Model {
    Model {
        id: list.id.clone(),
        name: list.name().to_string(),
        description: list.description().to_string(),
        icon: list.icon().to_string(),
        parent_id: list.parent_id.clone(),
        position: list.position(),
        last_synced: now.fixed_offset(),
    }
}

fn to_active_model(model: &Model) -> ActiveModel {
    ActiveModel {
        id: Set(model.id.clone()),
        name: Set(model.name.clone()),
        description: Set(model.description.clone()),
        icon: Set(model.icon.clone()),
        parent_id: Set(model.parent_id.clone()),
        position: Set(model.position),
        last_synced: Set(model.last_synced),
    }
}
