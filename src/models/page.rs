//! List queries and the page envelope returned by the API

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;

use crate::error::LoadError;

/// Envelope status the API uses for a usable page
pub const SUCCESS_STATUS: &str = "success";

/// What to list. Immutable for the lifetime of a list session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Path appended to the API base URL, e.g. `/vendors`
    pub endpoint: String,
    pub page_size: u32,
    /// Extra query parameters such as `category`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, String>,
}

impl ListQuery {
    pub fn new<S: Into<String>>(endpoint: S, page_size: u32) -> Self {
        Self {
            endpoint: endpoint.into(),
            page_size: page_size.max(1),
            filters: BTreeMap::new(),
        }
    }

    /// Add or replace a filter parameter
    pub fn with_filter<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }
}

/// `pagination` object of the envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Raw response body of one page fetch, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEnvelope {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub data: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A validated page
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

impl PageEnvelope {
    /// Successful envelope wrapping the given items
    pub fn success(items: Vec<JsonValue>, has_more: bool) -> Self {
        Self {
            status: SUCCESS_STATUS.to_string(),
            data: JsonValue::Array(items),
            pagination: Some(Pagination {
                has_more,
                ..Pagination::default()
            }),
            message: None,
        }
    }

    /// Validate the envelope and decode its items.
    ///
    /// Without a `pagination` object a full page implies more data. An empty
    /// page never does.
    pub fn into_page<T: DeserializeOwned>(self, page_size: u32) -> Result<PageResult<T>, LoadError> {
        if self.status != SUCCESS_STATUS {
            return Err(LoadError::Unsuccessful {
                status: self.status,
                message: self.message,
            });
        }

        let JsonValue::Array(raw_items) = self.data else {
            return Err(LoadError::malformed(format!(
                "expected `data` to be an array, got {}",
                json_type_name(&self.data)
            )));
        };

        let received = raw_items.len();
        let items = raw_items
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                serde_json::from_value::<T>(raw)
                    .map_err(|e| LoadError::malformed(format!("item {index}: {e}")))
            })
            .collect::<Result<Vec<T>, LoadError>>()?;

        let has_more = if received == 0 {
            false
        } else {
            match self.pagination {
                Some(pagination) => pagination.has_more,
                None => received >= page_size as usize,
            }
        };

        Ok(PageResult { items, has_more })
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
