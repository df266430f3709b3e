//! Customer/vendor connection item
//!
//! A connection is a customer's request to a vendor, listed on the
//! connections screen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use super::{Vendor, null_as_default, or_fallback, resolve_id};

/// Lifecycle status of a connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
    Completed,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Accepted => "accepted",
            ConnectionStatus::Declined => "declined",
            ConnectionStatus::Completed => "completed",
        }
    }

    fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "accepted" => ConnectionStatus::Accepted,
            "declined" | "rejected" => ConnectionStatus::Declined,
            "completed" => ConnectionStatus::Completed,
            "pending" => ConnectionStatus::Pending,
            other => {
                debug!(status = other, "Unknown connection status; treating as pending");
                ConnectionStatus::Pending
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ConnectionRecord")]
pub struct Connection {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<Vendor>,
    pub status: ConnectionStatus,
    pub service: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionRecord {
    #[serde(default)]
    id: Option<JsonValue>,
    #[serde(default, rename = "_id")]
    mongo_id: Option<JsonValue>,
    #[serde(default)]
    vendor: Option<Vendor>,
    #[serde(default, deserialize_with = "deserialize_status")]
    status: ConnectionStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    service: String,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<ConnectionRecord> for Connection {
    type Error = String;

    fn try_from(record: ConnectionRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: resolve_id(record.id, record.mongo_id)?,
            vendor: record.vendor,
            status: record.status,
            service: record.service,
            created_at: record.created_at,
        })
    }
}

impl Connection {
    pub fn vendor_name(&self) -> &str {
        self.vendor
            .as_ref()
            .map(Vendor::display_name)
            .unwrap_or("Unknown vendor")
    }

    pub fn service_label(&self) -> &str {
        or_fallback(&self.service, "General service")
    }
}

fn deserialize_status<'de, D>(deserializer: D) -> Result<ConnectionStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .as_deref()
        .map(ConnectionStatus::parse_lenient)
        .unwrap_or_default())
}

// Unparseable timestamps are dropped rather than failing the whole page.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }))
}
