//! Remote API response types.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::RemoteError;
use crate::entity::list::DEFAULT_ICON;

/// A list as reported by `GET /lists`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteList {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
}

impl RemoteList {
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn icon(&self) -> &str {
        self.icon.as_deref().unwrap_or(DEFAULT_ICON)
    }

    #[must_use]
    pub fn position(&self) -> i64 {
        self.position.unwrap_or(0)
    }
}

/// Identifier carried by a JSON value: a non-empty string, or a number
/// rendered in decimal.
#[must_use]
pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    id_from_value(&value)
        .ok_or_else(|| de::Error::custom(format!("expected a string or numeric id, got {value}")))
}

fn deserialize_optional_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => id_from_value(&value).map(Some).ok_or_else(|| {
            de::Error::custom(format!("expected a string or numeric id, got {value}"))
        }),
    }
}

/// One page of a collection after envelope normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub next_cursor: Option<String>,
}

/// Normalize a collection response into a plain sequence.
///
/// Accepted shapes: a bare array, or an object carrying the array under
/// `key` (e.g. `lists`, `bookmarks`) or `data`. Objects may also carry a
/// `nextCursor` for the following page. Anything else is rejected rather
/// than read as an empty collection, since an empty collection deletes
/// cached rows.
pub fn normalize_envelope(endpoint: &str, key: &str, body: Value) -> Result<Page, RemoteError> {
    match body {
        Value::Array(items) => Ok(Page {
            items,
            next_cursor: None,
        }),
        Value::Object(mut map) => {
            let next_cursor = map
                .get("nextCursor")
                .and_then(Value::as_str)
                .filter(|c| !c.is_empty())
                .map(str::to_string);

            match map.remove(key).or_else(|| map.remove("data")) {
                Some(Value::Array(items)) => Ok(Page { items, next_cursor }),
                _ => Err(RemoteError::UnexpectedShape {
                    endpoint: endpoint.to_string(),
                }),
            }
        }
        _ => Err(RemoteError::UnexpectedShape {
            endpoint: endpoint.to_string(),
        }),
    }
}

/// Decode raw list records.
pub fn decode_lists(endpoint: &str, items: Vec<Value>) -> Result<Vec<RemoteList>, RemoteError> {
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item).map_err(|source| RemoteError::Decode {
                endpoint: endpoint.to_string(),
                source,
            })
        })
        .collect()
}
