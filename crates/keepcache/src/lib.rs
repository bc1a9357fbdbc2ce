//! keepcache - a local mirror of a remote bookmark manager.
//!
//! This library keeps a SQLite cache of the remote's lists and the bookmarks
//! inside them, so that readers can serve cached data without calling the
//! remote API on every request.
//!
//! # Features
//!
//! - `sqlite` - Enables the SQLite driver (on by default).
//! - `migrate` - Enables database migration support. When enabled, you can use
//!   [`connect_and_migrate`] to automatically run migrations on connection.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use keepcache::remote::{ClientOptions, KeepClient};
//! use keepcache::sync::{CycleKind, Syncer};
//!
//! let db = keepcache::connect_and_migrate("sqlite://keepcache.db?mode=rwc").await?;
//! let client = KeepClient::new(ClientOptions::new("https://keep.example.com", "token"))?;
//! let syncer = Syncer::new(db, Arc::new(client));
//!
//! let report = syncer.run_cycle(CycleKind::Full, None).await?;
//! println!("{} lists cached", report.lists_synced);
//! ```

pub mod db;
pub mod entity;
pub mod http;
pub mod reader;
pub mod reconcile;
pub mod remote;
pub mod retry;
pub mod sync;

#[cfg(feature = "migrate")]
pub mod migration;

pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use reconcile::{ReconcileError, ReconcileStats};
pub use remote::{KeepClient, RemoteError, RemoteSource};
pub use sync::{CycleKind, CycleReport, Scheduler, SyncError, Syncer};
