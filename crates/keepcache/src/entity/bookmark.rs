//! Bookmark entity - a cached link owned by exactly one list.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Bookmark model - the cached projection of one remote link bookmark.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookmarks")]
pub struct Model {
    /// Remote-assigned identifier.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owning list.
    pub list_id: String,

    // ─── Content ─────────────────────────────────────────────────────────────
    pub title: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub url: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Text")]
    pub favicon: String,
    /// Opaque payload: `{"link_title": ..., "original_data": <remote record>}`.
    #[sea_orm(column_type = "Json")]
    pub metadata: serde_json::Value,

    // ─── Tracking ────────────────────────────────────────────────────────────
    /// The remote's own last-modified time. Used as the incremental watermark.
    pub modified_at: DateTimeWithTimeZone,
    /// When this row was last written by the syncer.
    pub last_synced: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A bookmark belongs to a list.
    #[sea_orm(
        belongs_to = "super::list::Entity",
        from = "Column::ListId",
        to = "super::list::Column::Id",
        on_delete = "Cascade"
    )]
    List,
}

impl Related<super::list::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::List.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The secondary "link title" extracted from the remote content object.
    pub fn link_title(&self) -> &str {
        self.metadata
            .get("link_title")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
    }

    /// Whether the cached content matches another row, ignoring sync bookkeeping.
    pub fn same_content(&self, other: &Model) -> bool {
        self.list_id == other.list_id
            && self.title == other.title
            && self.url == other.url
            && self.description == other.description
            && self.favicon == other.favicon
            && self.metadata == other.metadata
            && self.modified_at == other.modified_at
    }
}
