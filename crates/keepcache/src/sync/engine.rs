//! The sync orchestrator.
//!
//! A [`Syncer`] owns the store connection and the remote source and drives
//! one cycle at a time:
//!
//! 1. mark the status `running`
//! 2. fetch and reconcile the lists
//! 3. fetch and reconcile the bookmarks of every cached list
//! 4. mark the status `success`, or `error` with a short message

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use tokio::sync::Mutex;

use crate::entity::list::{Column as ListColumn, Entity as List};
use crate::reconcile::{reconcile_bookmarks_for_list, reconcile_lists};
use crate::remote::RemoteSource;

use super::error::{SyncError, short_error_message};
use super::progress::{ProgressCallback, SyncProgress, emit};
use super::status;
use super::types::{CycleKind, CycleReport};

/// Runs sync cycles against one cache and one remote.
///
/// At most one cycle runs at a time; a second start attempt is rejected
/// with [`SyncError::CycleInProgress`], never queued.
pub struct Syncer {
    db: DatabaseConnection,
    remote: Arc<dyn RemoteSource>,
    in_flight: Mutex<()>,
}

impl Syncer {
    pub fn new(db: DatabaseConnection, remote: Arc<dyn RemoteSource>) -> Self {
        Self {
            db,
            remote,
            in_flight: Mutex::new(()),
        }
    }

    /// The cache connection.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Whether a cycle is currently running.
    pub fn is_running(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Run one cycle.
    ///
    /// The outcome is always recorded in the sync status before returning;
    /// on failure the error is propagated after being recorded.
    ///
    /// # Errors
    /// - `SyncError::CycleInProgress` if another cycle is running
    /// - `SyncError::Fetch` / `SyncError::Reconcile` if a step failed
    /// - `SyncError::Database` if the cache could not be read or the status
    ///   could not be written
    pub async fn run_cycle(
        &self,
        kind: CycleKind,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<CycleReport, SyncError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::warn!(kind = %kind, "Sync already running, skipping cycle");
            emit(on_progress, SyncProgress::CycleSkipped { kind });
            return Err(SyncError::CycleInProgress);
        };

        let started_at = Utc::now();
        let timer = Instant::now();

        let previous = status::mark_running(&self.db).await?;
        let watermark = if kind.is_full() {
            None
        } else {
            previous
                .last_incremental_sync
                .map(|ts| ts.with_timezone(&Utc))
        };

        tracing::info!(kind = %kind, watermark = ?watermark, "Starting sync cycle");
        emit(on_progress, SyncProgress::CycleStarted { kind });

        let mut report = CycleReport::new(kind, started_at, watermark);

        // A failure to record success is a failed cycle like any other.
        let outcome = match self.sync_all(&mut report, on_progress).await {
            Ok(()) => status::mark_success(&self.db, kind, started_at)
                .await
                .map_err(SyncError::from),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(()) => {
                report.elapsed = timer.elapsed();

                tracing::info!(
                    kind = %kind,
                    lists = report.lists_synced,
                    written = report.bookmarks_written,
                    skipped = report.bookmarks_skipped,
                    deleted = report.bookmarks_deleted,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "Sync completed"
                );
                emit(
                    on_progress,
                    SyncProgress::CycleComplete {
                        report: report.clone(),
                    },
                );
                Ok(report)
            }
            Err(err) => {
                let message = short_error_message(&err);
                tracing::error!(kind = %kind, error = %err, "Sync failed");

                if let Err(db_err) = status::mark_error(&self.db, &message).await {
                    tracing::error!(error = %db_err, "Failed to record sync error");
                }
                emit(
                    on_progress,
                    SyncProgress::CycleFailed {
                        kind,
                        error: message,
                    },
                );
                Err(err)
            }
        }
    }

    async fn sync_all(
        &self,
        report: &mut CycleReport,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<(), SyncError> {
        emit(on_progress, SyncProgress::FetchingLists);
        let remote_lists = self
            .remote
            .fetch_lists(on_progress)
            .await
            .map_err(|source| SyncError::Fetch {
                what: "lists".to_string(),
                source,
            })?;

        let list_stats =
            reconcile_lists(&self.db, &remote_lists)
                .await
                .map_err(|source| SyncError::Reconcile {
                    what: "lists".to_string(),
                    source,
                })?;
        report.lists_deleted = list_stats.deleted;

        let lists = List::find()
            .order_by_asc(ListColumn::Position)
            .order_by_asc(ListColumn::Id)
            .all(&self.db)
            .await?;
        report.lists_synced = lists.len();

        emit(
            on_progress,
            SyncProgress::ListsReconciled {
                count: lists.len(),
                stats: list_stats,
            },
        );

        let total = lists.len();
        for (index, list) in lists.into_iter().enumerate() {
            tracing::info!(list_id = %list.id, name = %list.name, "Syncing bookmarks for list");
            emit(
                on_progress,
                SyncProgress::SyncingList {
                    list_id: list.id.clone(),
                    name: list.name.clone(),
                    index,
                    total,
                },
            );

            let records = self
                .remote
                .fetch_bookmarks(&list.id, on_progress)
                .await
                .map_err(|source| SyncError::Fetch {
                    what: format!("bookmarks of list {}", list.id),
                    source,
                })?;

            let stats =
                reconcile_bookmarks_for_list(&self.db, &list.id, &records, report.watermark)
                    .await
                    .map_err(|source| SyncError::Reconcile {
                        what: format!("bookmarks of list {}", list.id),
                        source,
                    })?;

            report.bookmarks_written += stats.applied();
            report.bookmarks_skipped += stats.skipped;
            report.bookmarks_deleted += stats.deleted;

            emit(
                on_progress,
                SyncProgress::ListSynced {
                    list_id: list.id,
                    stats,
                },
            );
        }

        Ok(())
    }
}
