//! Vendor listing item

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{null_as_default, or_fallback, resolve_id};

const UNNAMED_VENDOR: &str = "Unnamed vendor";
const UNKNOWN_LOCATION: &str = "Location unavailable";

/// A service provider (plumber, electrician, ...) as listed by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "VendorRecord")]
pub struct Vendor {
    pub id: String,
    pub name: String,
    pub category: String,
    pub rating: f32,
    pub review_count: u32,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub is_verified: bool,
}

/// Vendor as sent on the wire, before the id is resolved
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VendorRecord {
    #[serde(default)]
    id: Option<JsonValue>,
    #[serde(default, rename = "_id")]
    mongo_id: Option<JsonValue>,
    #[serde(default, deserialize_with = "null_as_default")]
    name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    rating: f32,
    #[serde(default, deserialize_with = "null_as_default")]
    review_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    location: Location,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    is_verified: bool,
}

impl TryFrom<VendorRecord> for Vendor {
    type Error = String;

    fn try_from(record: VendorRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: resolve_id(record.id, record.mongo_id)?,
            name: record.name,
            category: record.category,
            rating: record.rating,
            review_count: record.review_count,
            location: record.location,
            phone: record.phone,
            avatar_url: record.avatar_url,
            is_verified: record.is_verified,
        })
    }
}

/// Where a vendor operates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub area: String,
}

impl Vendor {
    pub fn display_name(&self) -> &str {
        or_fallback(&self.name, UNNAMED_VENDOR)
    }

    /// Rating clamped to the 0..=5 star range
    pub fn stars(&self) -> f32 {
        if self.rating.is_finite() {
            self.rating.clamp(0.0, 5.0)
        } else {
            0.0
        }
    }
}

impl Location {
    /// "area, city", whichever parts are present
    pub fn display(&self) -> String {
        let parts: Vec<&str> = [self.area.trim(), self.city.trim()]
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            UNKNOWN_LOCATION.to_string()
        } else {
            parts.join(", ")
        }
    }
}
