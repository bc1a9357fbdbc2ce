use sea_orm::DbErr;
use thiserror::Error;

/// Errors that can occur while applying a remote snapshot to the cache.
///
/// Any of these means the surrounding transaction was rolled back.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Bookmarks were reconciled for a list the cache does not hold.
    #[error("List not found in cache: {list_id}")]
    UnknownList { list_id: String },
}

/// Result type alias for reconcile operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;
