//! Sync orchestration.
//!
//! # Module Structure
//!
//! - [`types`] - Core types: `CycleKind`, `CycleReport`, constants
//! - [`progress`] - Progress reporting: `SyncProgress`, `ProgressCallback`, `emit()`
//! - [`engine`] - The orchestrator: [`Syncer::run_cycle`]
//! - [`scheduler`] - The polling loop: [`Scheduler::run`]
//! - [`status`] - The singleton sync status row
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use keepcache::sync::{Scheduler, Syncer};
//!
//! let syncer = Arc::new(Syncer::new(db, Arc::new(client)));
//! let scheduler = Scheduler::new(syncer, Duration::from_secs(300));
//! scheduler.run(async { tokio::signal::ctrl_c().await.ok(); }, None).await;
//! ```

pub mod engine;
mod error;
mod progress;
pub mod scheduler;
pub mod status;
mod types;

// Re-export types
pub use types::{CycleKind, CycleReport};

// Re-export constants
pub use types::{DEFAULT_INTERVAL_MINUTES, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_SECS, MAX_PAGES};

// Re-export progress types
pub use progress::{ProgressCallback, SyncProgress, emit};

pub use engine::Syncer;
pub use error::{SyncError, short_error_message};
pub use scheduler::Scheduler;
