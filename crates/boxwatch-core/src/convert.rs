// ── API-to-domain type conversions ──
//
// Bridges raw `boxwatch_api` response types into `boxwatch_core::model`.
// The rule configuration is not part of the API payload; the runner
// attaches it after conversion.

use boxwatch_api::{RawBox, RawLastMeasurement, RawSensor};

use crate::model::{BoxSummary, LastMeasurement, SenseBox, Sensor};

impl From<RawBox> for SenseBox {
    fn from(b: RawBox) -> Self {
        SenseBox {
            id: b.id,
            name: b.name,
            sensors: b.sensors.into_iter().map(Sensor::from).collect(),
            notify: None,
        }
    }
}

impl From<RawSensor> for Sensor {
    fn from(s: RawSensor) -> Self {
        Sensor {
            id: s.id,
            phenomenon: s.title,
            sensor_type: s.sensor_type,
            // Some boxes report an empty unit instead of omitting it.
            unit: s.unit.filter(|u| !u.is_empty()),
            last_measurement: s.last_measurement.map(LastMeasurement::from),
        }
    }
}

impl From<RawLastMeasurement> for LastMeasurement {
    fn from(m: RawLastMeasurement) -> Self {
        LastMeasurement {
            value: m.value,
            created_at: m.created_at,
        }
    }
}

impl From<boxwatch_api::BoxSummary> for BoxSummary {
    fn from(b: boxwatch_api::BoxSummary) -> Self {
        BoxSummary {
            id: b.id,
            name: b.name,
        }
    }
}
