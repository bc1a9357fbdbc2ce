//! Common re-exports for convenient entity usage.

pub use super::bookmark::{
    ActiveModel as BookmarkActiveModel, Column as BookmarkColumn, Entity as Bookmark,
    Model as BookmarkModel,
};
pub use super::list::{
    ActiveModel as ListActiveModel, Column as ListColumn, DEFAULT_ICON, Entity as List,
    Model as ListModel,
};
pub use super::sync_status::{
    ActiveModel as SyncStatusActiveModel, Column as SyncStatusColumn, Entity as SyncStatus,
    Model as SyncStatusModel, SINGLETON_ID, SyncState,
};
