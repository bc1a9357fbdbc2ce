//! Remote bookmark-manager API.
//!
//! # Module Structure
//!
//! - [`client`] - [`KeepClient`], authenticated GETs with retry and pagination
//! - [`types`] - Response types and envelope normalization
//! - [`convert`] - Field derivation for raw bookmark records
//! - [`error`] - [`RemoteError`] and retry classification

pub mod client;
pub mod convert;
pub mod error;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;

use crate::sync::ProgressCallback;

pub use client::{ClientOptions, KeepClient};
pub use convert::{BookmarkRecord, is_link, to_bookmark_record};
pub use error::{RemoteError, is_retryable, short_error_message};
pub use types::RemoteList;

/// Where a sync cycle reads remote state from.
///
/// [`KeepClient`] is the production implementation; tests drive the
/// orchestrator with scripted sources.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Every list the remote reports, in remote order.
    async fn fetch_lists(
        &self,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<RemoteList>, RemoteError>;

    /// Raw bookmark records of one list, all pages concatenated.
    async fn fetch_bookmarks(
        &self,
        list_id: &str,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<Value>, RemoteError>;
}
