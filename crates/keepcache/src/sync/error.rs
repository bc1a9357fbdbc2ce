//! Error types for sync cycles.

use sea_orm::DbErr;
use thiserror::Error;

use crate::reconcile::ReconcileError;
use crate::remote::{self, RemoteError};

/// Errors that end a sync cycle.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Another cycle holds the in-flight guard.
    #[error("A sync cycle is already running")]
    CycleInProgress,

    /// Fetching from the remote failed after all retries.
    #[error("Failed to fetch {what}: {source}")]
    Fetch {
        what: String,
        #[source]
        source: RemoteError,
    },

    /// Applying a snapshot failed and was rolled back.
    #[error("Failed to reconcile {what}: {source}")]
    Reconcile {
        what: String,
        #[source]
        source: ReconcileError,
    },

    /// Reading the cache or writing the sync status failed.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Get a short error message suitable for the sync status and progress output.
pub fn short_error_message(err: &SyncError) -> String {
    match err {
        SyncError::CycleInProgress => "Sync already running".to_string(),
        SyncError::Fetch { what, source } => {
            format!(
                "Failed to fetch {}: {}",
                what,
                remote::short_error_message(source)
            )
        }
        SyncError::Reconcile { what, source } => {
            format!("Failed to reconcile {}: {}", what, source)
        }
        SyncError::Database(e) => format!("Database error: {}", e),
    }
}
