// ── Box and sensor domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rule::NotifyConfig;

/// A sensor station snapshot, fetched fresh for every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenseBox {
    pub id: String,
    pub name: String,
    pub sensors: Vec<Sensor>,
    /// Resolved rule configuration, attached by the runner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify: Option<NotifyConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: String,
    /// Phenomenon name, e.g. "Temperatur".
    pub phenomenon: String,
    /// Hardware tag, e.g. "HDC1008".
    pub sensor_type: String,
    pub unit: Option<String>,
    /// `None` when the sensor has never reported.
    pub last_measurement: Option<LastMeasurement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastMeasurement {
    /// String-encoded number, exactly as reported.
    pub value: String,
    pub created_at: DateTime<Utc>,
}

/// Listing entry used to expand "all boxes" into ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxSummary {
    pub id: String,
    pub name: String,
}
