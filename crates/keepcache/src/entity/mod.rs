//! SeaORM entity definitions for the cache schema.

pub mod bookmark;
pub mod list;
pub mod prelude;
pub mod sync_status;
