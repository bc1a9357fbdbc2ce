//! The singleton sync status row.
//!
//! The row is created lazily by the first cycle and never deleted. Every
//! update runs as its own statement (or short transaction), never spanning
//! a network call.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, TransactionTrait,
};

use crate::entity::sync_status::{
    ActiveModel, Column, Entity as SyncStatus, Model, SINGLETON_ID, SyncState,
};

use super::types::CycleKind;

/// Load the status row, if a cycle ever ran.
pub async fn load<C: ConnectionTrait>(db: &C) -> Result<Option<Model>, DbErr> {
    SyncStatus::find_by_id(SINGLETON_ID).one(db).await
}

/// Create the row if needed, set `running` and clear the error.
///
/// Returns the row as it was before this call (timestamps of the previous
/// successful cycles included).
pub async fn mark_running(db: &DatabaseConnection) -> Result<Model, DbErr> {
    let txn = db.begin().await?;

    let previous = match load(&txn).await? {
        Some(row) => row,
        None => {
            let row = Model {
                id: SINGLETON_ID,
                last_full_sync: None,
                last_incremental_sync: None,
                status: SyncState::NeverSynced,
                error_message: None,
            };
            SyncStatus::insert(ActiveModel {
                id: Set(row.id),
                last_full_sync: Set(None),
                last_incremental_sync: Set(None),
                status: Set(row.status),
                error_message: Set(None),
            })
            .exec_without_returning(&txn)
            .await?;
            row
        }
    };

    update(
        &txn,
        ActiveModel {
            status: Set(SyncState::Running),
            error_message: Set(None),
            ..Default::default()
        },
    )
    .await?;

    txn.commit().await?;
    Ok(previous)
}

/// Record a successful cycle that started at `started_at`.
///
/// `last_incremental_sync` only moves forward; `last_full_sync` is set for
/// full cycles.
pub async fn mark_success(
    db: &DatabaseConnection,
    kind: CycleKind,
    started_at: DateTime<Utc>,
) -> Result<(), DbErr> {
    let txn = db.begin().await?;

    let previous = load(&txn)
        .await?
        .and_then(|row| row.last_incremental_sync)
        .map(|ts| ts.with_timezone(&Utc));
    let incremental = match previous {
        Some(prev) if prev > started_at => prev,
        _ => started_at,
    };

    let mut am = ActiveModel {
        status: Set(SyncState::Success),
        error_message: Set(None),
        last_incremental_sync: Set(Some(incremental.fixed_offset())),
        ..Default::default()
    };
    if kind.is_full() {
        am.last_full_sync = Set(Some(started_at.fixed_offset()));
    }

    update(&txn, am).await?;
    txn.commit().await
}

/// Record a failed cycle.
pub async fn mark_error(db: &DatabaseConnection, message: &str) -> Result<(), DbErr> {
    update(
        db,
        ActiveModel {
            status: Set(SyncState::Error),
            error_message: Set(Some(message.to_string())),
            ..Default::default()
        },
    )
    .await
}

async fn update<C: ConnectionTrait>(db: &C, am: ActiveModel) -> Result<(), DbErr> {
    SyncStatus::update_many()
        .set(am)
        .filter(Column::Id.eq(SINGLETON_ID))
        .exec(db)
        .await?;
    Ok(())
}
