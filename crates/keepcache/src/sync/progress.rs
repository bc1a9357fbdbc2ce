//! Progress reporting types for sync cycles.
//!
//! The orchestrator, the remote client and the retry helper all publish
//! events through the same optional callback so a front end can render
//! progress bars or structured log lines without knowing who emitted what.

use crate::reconcile::ReconcileStats;

use super::types::{CycleKind, CycleReport};

/// Progress events emitted during a sync cycle.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// A cycle acquired the in-flight guard and marked the status `running`.
    CycleStarted {
        /// Full or incremental.
        kind: CycleKind,
    },

    /// A cycle was requested while another one was running and got rejected.
    CycleSkipped {
        /// The kind of the rejected cycle.
        kind: CycleKind,
    },

    /// Fetching the remote's lists.
    FetchingLists,

    /// Fetched one page of a (possibly paginated) collection.
    FetchedPage {
        /// Endpoint relative to the API prefix.
        endpoint: String,
        /// Page number (1-indexed).
        page: u32,
        /// Records on this page.
        count: usize,
    },

    /// The lists reconciliation committed.
    ListsReconciled {
        /// Number of lists reported by the remote (after de-duplication).
        count: usize,
        /// Counts of what was written.
        stats: ReconcileStats,
    },

    /// Starting to sync the bookmarks of one list.
    SyncingList {
        /// Remote list identifier.
        list_id: String,
        /// List display name.
        name: String,
        /// Position of this list in the cycle (0-indexed).
        index: usize,
        /// Number of lists in the cycle.
        total: usize,
    },

    /// The bookmarks of one list were reconciled.
    ListSynced {
        /// Remote list identifier.
        list_id: String,
        /// Counts of what was written.
        stats: ReconcileStats,
    },

    /// A remote request failed and will be retried after a delay.
    FetchRetry {
        /// Endpoint relative to the API prefix.
        endpoint: String,
        /// Attempt number that just failed (1-indexed).
        attempt: u32,
        /// Time to wait before the next attempt (ms).
        retry_after_ms: u64,
        /// Short description of the failure.
        error: String,
    },

    /// Warning message (non-fatal).
    Warning {
        /// Warning message.
        message: String,
    },

    /// A cycle finished and the status was set to `success`.
    CycleComplete {
        /// Totals of the cycle.
        report: CycleReport,
    },

    /// A cycle failed and the status was set to `error`.
    CycleFailed {
        /// Full or incremental.
        kind: CycleKind,
        /// The message recorded in the sync status.
        error: String,
    },
}

/// Callback for progress updates during sync operations.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
///
/// This is a convenience function to avoid repetitive `if let Some(cb) = ...` patterns.
///
/// # Example
///
/// ```ignore
/// use keepcache::sync::{emit, SyncProgress, ProgressCallback};
///
/// fn my_sync(on_progress: Option<&ProgressCallback>) {
///     emit(on_progress, SyncProgress::FetchingLists);
/// }
/// ```
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
