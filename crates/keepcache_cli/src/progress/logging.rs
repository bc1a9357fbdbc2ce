use keepcache::sync::SyncProgress;

/// Logging reporter using tracing for structured output.
///
/// Cycle start, end and retries are already logged by the library, so those
/// events only show up at debug level here.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: SyncProgress) {
        match event {
            SyncProgress::CycleStarted { kind } => {
                tracing::debug!(kind = %kind, "Sync cycle started");
            }

            SyncProgress::CycleSkipped { kind } => {
                tracing::debug!(kind = %kind, "Sync cycle skipped, another one is running");
            }

            SyncProgress::FetchingLists => {
                tracing::debug!("Fetching lists");
            }

            SyncProgress::FetchedPage {
                endpoint,
                page,
                count,
            } => {
                tracing::debug!(endpoint = %endpoint, page, count, "Fetched page");
            }

            SyncProgress::ListsReconciled { count, stats } => {
                tracing::info!(
                    count,
                    inserted = stats.inserted,
                    updated = stats.updated,
                    deleted = stats.deleted,
                    "Lists reconciled"
                );
            }

            SyncProgress::SyncingList {
                list_id,
                name,
                index,
                total,
            } => {
                tracing::debug!(list_id = %list_id, name = %name, index, total, "Syncing list");
            }

            SyncProgress::ListSynced { list_id, stats } => {
                tracing::debug!(
                    list_id = %list_id,
                    inserted = stats.inserted,
                    updated = stats.updated,
                    skipped = stats.skipped,
                    deleted = stats.deleted,
                    "List synced"
                );
            }

            SyncProgress::FetchRetry {
                endpoint,
                attempt,
                retry_after_ms,
                error,
            } => {
                tracing::debug!(
                    endpoint = %endpoint,
                    attempt,
                    retry_after_ms,
                    error = %error,
                    "Request failed, backing off"
                );
            }

            SyncProgress::Warning { message } => {
                tracing::warn!(message = %message, "Warning");
            }

            SyncProgress::CycleComplete { report } => {
                tracing::debug!(
                    kind = %report.kind,
                    lists = report.lists_synced,
                    written = report.bookmarks_written,
                    skipped = report.bookmarks_skipped,
                    deleted = report.bookmarks_deleted,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "Sync cycle complete"
                );
            }

            SyncProgress::CycleFailed { kind, error } => {
                tracing::debug!(kind = %kind, error = %error, "Sync cycle failed");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
