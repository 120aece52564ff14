// measurement_age: FAILED when the last measurement is older than the threshold.

use chrono::{DateTime, Utc};

use crate::model::LastMeasurement;

pub(super) fn check(
    threshold: &str,
    measurement: &LastMeasurement,
    now: DateTime<Utc>,
) -> Result<bool, String> {
    let max_age = humantime::parse_duration(threshold.trim())
        .map_err(|e| format!("invalid duration '{threshold}': {e}"))?;
    let max_age = chrono::Duration::from_std(max_age)
        .map_err(|e| format!("duration '{threshold}' out of range: {e}"))?;

    Ok(now - measurement.created_at > max_age)
}
