//! SyncStatus entity - the singleton row describing sync progress.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Primary key of the only row this table ever holds.
pub const SINGLETON_ID: i32 = 1;

/// Current state of the sync machinery.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    #[sea_orm(string_value = "never_synced")]
    #[default]
    NeverSynced,
    #[sea_orm(string_value = "running")]
    Running,
    #[sea_orm(string_value = "success")]
    Success,
    #[sea_orm(string_value = "error")]
    Error,
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncState::NeverSynced => write!(f, "never_synced"),
            SyncState::Running => write!(f, "running"),
            SyncState::Success => write!(f, "success"),
            SyncState::Error => write!(f, "error"),
        }
    }
}

/// SyncStatus model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sync_status")]
pub struct Model {
    /// Always [`SINGLETON_ID`].
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,

    pub last_full_sync: Option<DateTimeWithTimeZone>,
    pub last_incremental_sync: Option<DateTimeWithTimeZone>,
    pub status: SyncState,
    /// Set only while `status` is [`SyncState::Error`].
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_never_synced() {
        assert_eq!(SyncState::default(), SyncState::NeverSynced);
    }

    #[test]
    fn display_matches_stored_values() {
        assert_eq!(SyncState::NeverSynced.to_string(), "never_synced");
        assert_eq!(SyncState::Running.to_string(), "running");
        assert_eq!(SyncState::Success.to_string(), "success");
        assert_eq!(SyncState::Error.to_string(), "error");
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&SyncState::NeverSynced).unwrap();
        assert_eq!(json, "\"never_synced\"");
    }
}
