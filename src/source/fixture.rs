//! Fixture page source
//!
//! Serves pages from in-memory JSON arrays keyed by endpoint. Used for demos
//! and offline development in place of the remote API.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use tracing::debug;

use crate::error::LoadError;
use crate::models::PageEnvelope;
use crate::source::trait_::{PageRequest, PageSource};

/// Page source over static data
#[derive(Debug, Clone, Default)]
pub struct FixturePageSource {
    collections: HashMap<String, Vec<JsonValue>>,
}

impl FixturePageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source preloaded with sample vendors and connections
    pub fn builtin() -> Self {
        Self::new()
            .with_collection("/vendors", builtin_vendors())
            .with_collection("/connections", builtin_connections())
    }

    /// Register (or replace) the items served for an endpoint
    pub fn with_collection<S: Into<String>>(mut self, endpoint: S, items: Vec<JsonValue>) -> Self {
        self.collections
            .insert(normalize_endpoint(&endpoint.into()), items);
        self
    }

    /// Parse `{ "/endpoint": [ ... ], ... }`
    pub fn from_json_str(contents: &str) -> Result<Self, LoadError> {
        let parsed: HashMap<String, Vec<JsonValue>> = serde_json::from_str(contents)
            .map_err(|e| LoadError::configuration(format!("invalid fixture file: {e}")))?;

        Ok(parsed
            .into_iter()
            .fold(Self::new(), |source, (endpoint, items)| {
                source.with_collection(endpoint, items)
            }))
    }

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LoadError::configuration(format!(
                "failed to read fixture file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&contents)
    }

    fn matching_items<'a>(&'a self, request: &PageRequest) -> Option<Vec<&'a JsonValue>> {
        let items = self.collections.get(&normalize_endpoint(&request.endpoint))?;
        Some(
            items
                .iter()
                .filter(|item| {
                    request
                        .filters
                        .iter()
                        .all(|(key, wanted)| field_matches(item, key, wanted))
                })
                .collect(),
        )
    }
}

#[async_trait]
impl PageSource for FixturePageSource {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn fetch_page(&self, request: PageRequest) -> Result<PageEnvelope, LoadError> {
        let Some(items) = self.matching_items(&request) else {
            return Err(LoadError::http(
                404,
                Some(format!("no fixture for endpoint {}", request.endpoint)),
            ));
        };

        let limit = request.limit.max(1) as usize;
        let start = (request.page.max(1) as usize - 1).saturating_mul(limit);
        let page: Vec<JsonValue> = items
            .iter()
            .skip(start)
            .take(limit)
            .map(|item| (*item).clone())
            .collect();
        let has_more = start + page.len() < items.len();

        debug!(
            endpoint = %request.endpoint,
            page = request.page,
            returned = page.len(),
            total = items.len(),
            "Serving fixture page"
        );

        let mut envelope = PageEnvelope::success(page, has_more);
        if let Some(pagination) = envelope.pagination.as_mut() {
            pagination.page = Some(request.page);
            pagination.total = Some(items.len() as u64);
        }
        Ok(envelope)
    }
}

fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn field_matches(item: &JsonValue, key: &str, wanted: &str) -> bool {
    match item.get(key) {
        Some(JsonValue::String(s)) => s.eq_ignore_ascii_case(wanted),
        Some(JsonValue::Number(n)) => n.to_string() == wanted,
        Some(JsonValue::Bool(b)) => b.to_string() == wanted,
        _ => false,
    }
}

fn builtin_vendors() -> Vec<JsonValue> {
    let rows = [
        ("v-101", "Ace Plumbing Works", "plumbing", 4.7, 212, "Pune", "Baner", true),
        ("v-102", "Bright Sparks Electricals", "electrical", 4.5, 98, "Pune", "Kothrud", true),
        ("v-103", "FlowFix Plumbers", "plumbing", 4.1, 37, "Mumbai", "Andheri", false),
        ("v-104", "SafeWire Solutions", "electrical", 4.8, 301, "Mumbai", "Powai", true),
        ("v-105", "Sparkle Home Cleaning", "cleaning", 4.3, 76, "Pune", "Wakad", false),
        ("v-106", "WoodCraft Carpentry", "carpentry", 4.6, 143, "Nagpur", "Dharampeth", true),
        ("v-107", "QuickDrain Services", "plumbing", 3.9, 18, "Nagpur", "Sitabuldi", false),
        ("v-108", "Volt Masters", "electrical", 4.2, 54, "Pune", "Hadapsar", false),
        ("v-109", "Fresh Nest Cleaners", "cleaning", 4.9, 410, "Mumbai", "Bandra", true),
        ("v-110", "Pipe Pros", "plumbing", 4.4, 88, "Pune", "Aundh", true),
        ("v-111", "Cool Breeze AC Repair", "appliance", 4.0, 63, "Mumbai", "Thane", false),
        ("v-112", "Fine Finish Painters", "painting", 4.5, 120, "Nagpur", "Civil Lines", true),
    ];

    rows.into_iter()
        .map(|(id, name, category, rating, reviews, city, area, verified)| {
            json!({
                "id": id,
                "name": name,
                "category": category,
                "rating": rating,
                "reviewCount": reviews,
                "location": { "city": city, "area": area },
                "isVerified": verified,
            })
        })
        .collect()
}

fn builtin_connections() -> Vec<JsonValue> {
    let rows = [
        ("c-201", "v-101", "Ace Plumbing Works", "accepted", "Kitchen sink leak", "2024-06-02T09:30:00Z"),
        ("c-202", "v-104", "SafeWire Solutions", "pending", "Inverter installation", "2024-06-03T14:10:00Z"),
        ("c-203", "v-105", "Sparkle Home Cleaning", "completed", "Deep cleaning", "2024-05-21T08:00:00Z"),
        ("c-204", "v-106", "WoodCraft Carpentry", "declined", "Wardrobe repair", "2024-05-18T11:45:00Z"),
        ("c-205", "v-109", "Fresh Nest Cleaners", "accepted", "Sofa shampoo", "2024-06-05T16:20:00Z"),
    ];

    rows.into_iter()
        .map(|(id, vendor_id, vendor_name, status, service, created_at)| {
            json!({
                "id": id,
                "vendor": { "id": vendor_id, "name": vendor_name },
                "status": status,
                "service": service,
                "createdAt": created_at,
            })
        })
        .collect()
}
