//! Reconciliation of remote snapshots against the cache.
//!
//! Each operation runs in its own transaction: it loads the cached rows of
//! its scope, upserts every remote record, deletes every cached row the
//! remote no longer reports, and commits. A failure anywhere leaves the
//! cache exactly as it was.

mod bookmarks;
mod errors;
mod lists;

use std::collections::HashMap;
use std::hash::Hash;

pub use bookmarks::reconcile_bookmarks_for_list;
pub use errors::{ReconcileError, Result};
pub use lists::reconcile_lists;

/// Maximum number of bound ids per `IN (...)` clause.
pub(crate) const ID_CHUNK_SIZE: usize = 500;

/// Counts of what one reconcile call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Rows created.
    pub inserted: usize,
    /// Existing rows whose content changed.
    pub updated: usize,
    /// Existing rows rewritten with identical content (only `last_synced` moved).
    pub unchanged: usize,
    /// Records left untouched because they predate the watermark.
    pub skipped: usize,
    /// Cached rows removed because the remote stopped reporting them.
    pub deleted: usize,
}

impl ReconcileStats {
    /// Rows written by this call.
    #[must_use]
    pub fn applied(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }

    /// Rows the remote reported (written or skipped).
    #[must_use]
    pub fn seen(&self) -> usize {
        self.applied() + self.skipped
    }
}

/// De-duplicate by key: the last occurrence wins, placed where the key
/// first appeared.
pub(crate) fn dedup_last_wins<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut out: Vec<T> = Vec::new();

    for item in items {
        match index.get(&key(&item)) {
            Some(&i) => out[i] = item,
            None => {
                index.insert(key(&item), out.len());
                out.push(item);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_applied_and_seen() {
        let stats = ReconcileStats {
            inserted: 2,
            updated: 1,
            unchanged: 4,
            skipped: 3,
            deleted: 5,
        };
        assert_eq!(stats.applied(), 7);
        assert_eq!(stats.seen(), 10);
    }

    #[test]
    fn test_dedup_last_wins_keeps_first_position() {
        let items = vec![("a", 1), ("b", 2), ("a", 3), ("c", 4), ("b", 5)];
        let out = dedup_last_wins(items, |(k, _)| *k);
        assert_eq!(out, vec![("a", 3), ("b", 5), ("c", 4)]);
    }

    #[test]
    fn test_dedup_empty() {
        let out: Vec<(&str, i32)> = dedup_last_wins(Vec::new(), |(k, _): &(&str, i32)| *k);
        assert!(out.is_empty());
    }

    #[test]
    fn test_reconcile_error_display() {
        let err = ReconcileError::UnknownList {
            list_id: "L9".to_string(),
        };
        assert_eq!(err.to_string(), "List not found in cache: L9");

        let err: ReconcileError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert!(err.to_string().contains("Database error"));
    }
}
