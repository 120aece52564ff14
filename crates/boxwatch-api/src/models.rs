// Wire types for the openSenseMap box API.
//
// Field names follow the API's JSON (`_id`, `sensorType`, `createdAt`).
// These are transport shapes only; `boxwatch-core` converts them into its
// domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A full box as returned by `GET /boxes/{id}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawBox {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sensors: Vec<RawSensor>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSensor {
    #[serde(rename = "_id")]
    pub id: String,
    /// Phenomenon name, e.g. "Temperatur".
    #[serde(default)]
    pub title: String,
    #[serde(rename = "sensorType", default)]
    pub sensor_type: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(rename = "lastMeasurement", default)]
    pub last_measurement: Option<RawLastMeasurement>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawLastMeasurement {
    pub value: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Minimal box listing entry from `GET /boxes?minimal=true`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BoxSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Query filters for listing boxes. Unset filters are omitted.
///
/// `date` and `phenomenon` must be given together; the API rejects
/// either one alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoxFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouptag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phenomenon: Option<String>,
}

/// Error body shape: `{"code": "NotFound", "message": "Box not found"}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
