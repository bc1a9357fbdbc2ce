//! Sync cycle types and constants.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Default interval between incremental cycles, in minutes.
pub const DEFAULT_INTERVAL_MINUTES: u64 = 5;

/// Default base delay for remote retries, in seconds.
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 30;

/// Default number of retries after the first failed attempt.
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// Upper bound on the number of pages followed for one collection.
pub const MAX_PAGES: u32 = 1_000;

/// Whether a cycle re-applies every record or honours the watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    /// No watermark; every fetched bookmark is rewritten.
    Full,
    /// Bookmarks not modified since the previous cycle are left untouched.
    Incremental,
}

impl CycleKind {
    #[must_use]
    pub fn is_full(self) -> bool {
        matches!(self, Self::Full)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
        }
    }
}

impl fmt::Display for CycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Totals of one successful cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Full or incremental.
    pub kind: CycleKind,
    /// When the cycle started; recorded as the sync timestamp.
    pub started_at: DateTime<Utc>,
    /// Watermark used for bookmark reconciliation (`None` for full cycles).
    pub watermark: Option<DateTime<Utc>>,
    /// Number of lists in the cache after list reconciliation.
    pub lists_synced: usize,
    /// Number of lists the remote stopped reporting.
    pub lists_deleted: usize,
    /// Bookmarks inserted or rewritten across all lists.
    pub bookmarks_written: usize,
    /// Bookmarks left untouched because of the watermark.
    pub bookmarks_skipped: usize,
    /// Bookmarks the remote stopped reporting.
    pub bookmarks_deleted: usize,
    /// Wall time of the cycle.
    pub elapsed: Duration,
}

impl CycleReport {
    pub(crate) fn new(
        kind: CycleKind,
        started_at: DateTime<Utc>,
        watermark: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            kind,
            started_at,
            watermark,
            lists_synced: 0,
            lists_deleted: 0,
            bookmarks_written: 0,
            bookmarks_skipped: 0,
            bookmarks_deleted: 0,
            elapsed: Duration::ZERO,
        }
    }
}
