//! List entity - a remote collection that owns bookmarks.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Icon stored for lists that do not carry one.
pub const DEFAULT_ICON: &str = "📁";

/// List model - one row per list reported by the remote.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lists")]
pub struct Model {
    /// Remote-assigned identifier.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(default_value = "📁")]
    pub icon: String,
    /// Parent list identifier. Advisory only: no tree shape is enforced.
    pub parent_id: Option<String>,
    /// Display order as reported by the remote.
    pub position: i64,

    /// When this row was last written by the syncer.
    pub last_synced: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A list owns its bookmarks.
    #[sea_orm(has_many = "super::bookmark::Entity")]
    Bookmarks,
}

impl Related<super::bookmark::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookmarks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the user-visible fields match another row, ignoring sync bookkeeping.
    pub fn same_content(&self, other: &Model) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.icon == other.icon
            && self.parent_id == other.parent_id
            && self.position == other.position
    }
}
