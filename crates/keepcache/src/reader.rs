//! Read-only projections of the cache for front ends.
//!
//! Every function here only reads; it can run concurrently with a sync
//! cycle and sees either the state before or after each reconcile
//! transaction. The views serialize to the camelCase JSON shapes the
//! dashboard consumes.

use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use serde::Serialize;
use thiserror::Error;

use crate::entity::bookmark::{Column as BookmarkColumn, Entity as Bookmark, Model as BookmarkModel};
use crate::entity::list::{Column as ListColumn, Entity as List, Model as ListModel};
use crate::entity::sync_status::{Model as SyncStatusModel, SyncState};
use crate::sync::status;

/// Errors that can occur while reading the cache.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, ReaderError>;

/// A cached list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub parent_id: Option<String>,
    pub position: i64,
}

impl From<ListModel> for ListView {
    fn from(model: ListModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            icon: model.icon,
            parent_id: model.parent_id,
            position: model.position,
        }
    }
}

/// The `content` object of a bookmark view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookmarkContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub favicon: String,
}

/// The `metadata` object of a bookmark view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookmarkMetadata {
    pub title: String,
    pub description: String,
    pub favicon: String,
}

/// A cached bookmark.
///
/// `name` and `sourceUrl` repeat `title` and `url` for clients written
/// against the remote's own field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkView {
    pub id: String,
    pub list_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_name: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub url: String,
    pub source_url: String,
    pub description: String,
    pub favicon: String,
    pub content: BookmarkContent,
    pub metadata: BookmarkMetadata,
    pub modified_at: String,
}

impl BookmarkView {
    fn new(model: BookmarkModel, list_name: Option<String>) -> Self {
        let link_title = model.link_title().to_string();
        Self {
            content: BookmarkContent {
                kind: "link".to_string(),
                url: model.url.clone(),
                title: link_title.clone(),
                description: model.description.clone(),
                favicon: model.favicon.clone(),
            },
            metadata: BookmarkMetadata {
                title: link_title,
                description: model.description.clone(),
                favicon: model.favicon.clone(),
            },
            modified_at: iso_utc(model.modified_at.with_timezone(&Utc)),
            id: model.id,
            list_id: model.list_id,
            list_name,
            name: model.title.clone(),
            title: model.title,
            source_url: model.url.clone(),
            url: model.url,
            description: model.description,
            favicon: model.favicon,
        }
    }
}

/// The sync status as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusView {
    pub status: SyncState,
    pub last_full_sync: Option<String>,
    pub last_incremental_sync: Option<String>,
    pub error: Option<String>,
}

impl Default for SyncStatusView {
    fn default() -> Self {
        Self {
            status: SyncState::NeverSynced,
            last_full_sync: None,
            last_incremental_sync: None,
            error: None,
        }
    }
}

impl From<SyncStatusModel> for SyncStatusView {
    fn from(model: SyncStatusModel) -> Self {
        Self {
            status: model.status,
            last_full_sync: model
                .last_full_sync
                .map(|ts| iso_utc(ts.with_timezone(&Utc))),
            last_incremental_sync: model
                .last_incremental_sync
                .map(|ts| iso_utc(ts.with_timezone(&Utc))),
            error: model.error_message,
        }
    }
}

/// Cache totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub lists: u64,
    pub bookmarks: u64,
    pub sync_status: SyncStatusView,
}

/// ISO-8601 in UTC with a `Z` suffix.
fn iso_utc(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// All cached lists, by position then name.
pub async fn all_lists<C: ConnectionTrait>(db: &C) -> Result<Vec<ListView>> {
    let lists = List::find()
        .order_by_asc(ListColumn::Position)
        .order_by_asc(ListColumn::Name)
        .all(db)
        .await?;
    Ok(lists.into_iter().map(ListView::from).collect())
}

/// Cached bookmarks of one list, most recently modified first.
///
/// An unknown list yields an empty result.
pub async fn bookmarks_for_list<C: ConnectionTrait>(
    db: &C,
    list_id: &str,
) -> Result<Vec<BookmarkView>> {
    let bookmarks = Bookmark::find()
        .filter(BookmarkColumn::ListId.eq(list_id))
        .order_by_desc(BookmarkColumn::ModifiedAt)
        .order_by_asc(BookmarkColumn::Id)
        .all(db)
        .await?;
    Ok(bookmarks
        .into_iter()
        .map(|b| BookmarkView::new(b, None))
        .collect())
}

/// Every cached bookmark with the name of its list.
pub async fn all_bookmarks<C: ConnectionTrait>(db: &C) -> Result<Vec<BookmarkView>> {
    let rows = Bookmark::find()
        .find_also_related(List)
        .order_by_desc(BookmarkColumn::ModifiedAt)
        .order_by_asc(BookmarkColumn::Id)
        .all(db)
        .await?;
    Ok(with_list_names(rows))
}

/// Case-insensitive substring search over title, URL and description.
///
/// A blank query matches nothing. `%` and `_` in the query match literally.
pub async fn search_bookmarks<C: ConnectionTrait>(
    db: &C,
    query: &str,
) -> Result<Vec<BookmarkView>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
    let contains = |column: BookmarkColumn| {
        Expr::expr(Func::lower(Expr::col((Bookmark, column))))
            .like(LikeExpr::new(pattern.clone()).escape('\\'))
    };

    let rows = Bookmark::find()
        .find_also_related(List)
        .filter(
            Condition::any()
                .add(contains(BookmarkColumn::Title))
                .add(contains(BookmarkColumn::Url))
                .add(contains(BookmarkColumn::Description)),
        )
        .order_by_desc(BookmarkColumn::ModifiedAt)
        .order_by_asc(BookmarkColumn::Id)
        .all(db)
        .await?;
    Ok(with_list_names(rows))
}

/// The sync status; `never_synced` with empty fields before the first cycle.
pub async fn sync_status<C: ConnectionTrait>(db: &C) -> Result<SyncStatusView> {
    Ok(status::load(db)
        .await?
        .map(SyncStatusView::from)
        .unwrap_or_default())
}

/// List and bookmark counts plus the sync status.
pub async fn stats<C: ConnectionTrait>(db: &C) -> Result<Stats> {
    Ok(Stats {
        lists: List::find().count(db).await?,
        bookmarks: Bookmark::find().count(db).await?,
        sync_status: sync_status(db).await?,
    })
}

fn with_list_names(rows: Vec<(BookmarkModel, Option<ListModel>)>) -> Vec<BookmarkView> {
    rows.into_iter()
        .map(|(bookmark, list)| {
            let list_name = list.map(|l| l.name).unwrap_or_default();
            BookmarkView::new(bookmark, Some(list_name))
        })
        .collect()
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
