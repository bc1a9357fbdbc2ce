//! Conversion from raw remote bookmark records to cache fields.
//!
//! Remote records are loosely shaped: most fields may live in the nested
//! `content` object, at the top level, or in `metadata`. Each derived field
//! takes the first non-empty candidate.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Value, json};

use super::types::id_from_value;

/// URL stored when a record carries none.
pub const MISSING_URL: &str = "#";

/// Cache-ready fields derived from one remote bookmark record.
#[derive(Debug, Clone, PartialEq)]
pub struct BookmarkRecord {
    pub id: String,
    pub title: Option<String>,
    pub url: String,
    pub description: String,
    pub favicon: String,
    /// `{"link_title": ..., "original_data": <verbatim record>}`
    pub metadata: Value,
    pub modified_at: DateTime<Utc>,
}

/// Whether a record participates in the cache.
///
/// Records without a content marker (absent, null or empty) are kept;
/// otherwise only `content.type == "link"` is.
#[must_use]
pub fn is_link(record: &Value) -> bool {
    match record.get("content") {
        None | Some(Value::Null) => true,
        Some(Value::Object(content)) if content.is_empty() => true,
        Some(Value::String(s)) if s.is_empty() => true,
        Some(content) => content.get("type").and_then(Value::as_str) == Some("link"),
    }
}

/// Identifier of a record, accepting string or numeric ids.
#[must_use]
pub fn record_id(record: &Value) -> Option<String> {
    id_from_value(record.get("id")?)
}

/// Remote last-modified time (`modifiedAt`, then `updatedAt`).
///
/// Returns `now` with a warning when the record carries no parseable time.
#[must_use]
pub fn modified_at(record: &Value, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(raw) = first_str(&[record.get("modifiedAt"), record.get("updatedAt")]) else {
        return now;
    };

    match parse_timestamp(raw) {
        Some(ts) => ts,
        None => {
            tracing::warn!(
                id = ?record.get("id"),
                value = raw,
                "Unparseable bookmark timestamp, treating as modified now"
            );
            now
        }
    }
}

/// Parse an ISO-8601 timestamp; values without an offset are taken as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Derive the cache fields of a remote record.
///
/// Returns `None` for records without an identifier.
#[must_use]
pub fn to_bookmark_record(record: &Value, now: DateTime<Utc>) -> Option<BookmarkRecord> {
    let id = record_id(record)?;

    let content = record.get("content");
    let metadata = record.get("metadata");
    let title = first_str(&[record.get("title"), record.get("name")]).map(str::to_string);
    let url = first_str(&[
        nested(content, "url"),
        record.get("url"),
        record.get("sourceUrl"),
    ])
    .unwrap_or(MISSING_URL)
    .to_string();
    let description = first_str(&[
        nested(content, "description"),
        record.get("description"),
        nested(metadata, "description"),
    ])
    .unwrap_or_default()
    .to_string();
    let favicon = first_str(&[
        nested(content, "favicon"),
        record.get("favicon"),
        nested(metadata, "favicon"),
    ])
    .unwrap_or_default()
    .to_string();
    let link_title = first_str(&[nested(content, "title"), nested(metadata, "title")])
        .unwrap_or_default()
        .to_string();

    Some(BookmarkRecord {
        id,
        title,
        url,
        description,
        favicon,
        metadata: json!({
            "link_title": link_title,
            "original_data": record,
        }),
        modified_at: modified_at(record, now),
    })
}

fn nested<'a>(obj: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    obj.and_then(|o| o.get(key))
}

/// First candidate that is a non-empty string.
fn first_str<'a>(candidates: &[Option<&'a Value>]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|v| v.and_then(Value::as_str))
        .find(|s| !s.is_empty())
}
