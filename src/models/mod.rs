//! # Data Models
//!
//! Item schemas returned by the marketplace API and the page envelope they
//! arrive in. Fields the API may omit or send as `null` decode to defaults
//! here, at the boundary, so renderers never deal with missing values.

use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

pub mod connection;
pub mod page;
pub mod vendor;

pub use connection::{Connection, ConnectionStatus};
pub use page::{ListQuery, PageEnvelope, PageResult, Pagination};
pub use vendor::{Location, Vendor};

/// Decode an optional field, mapping `null` to the type's default
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Pick the item id from `id`, falling back to Mongo-style `_id`.
///
/// Either may be a string or a number; blank strings and `null` count as absent.
pub(crate) fn resolve_id(
    id: Option<JsonValue>,
    mongo_id: Option<JsonValue>,
) -> Result<String, String> {
    [id, mongo_id]
        .into_iter()
        .flatten()
        .find_map(|value| match value {
            JsonValue::String(s) if !s.trim().is_empty() => Some(s),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .ok_or_else(|| "expected a non-empty string or number in `id` or `_id`".to_string())
}

/// Trim a display string, falling back when it is blank
pub(crate) fn or_fallback<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() { fallback } else { trimmed }
}
