// measurement_min / measurement_max: numeric comparison against the threshold.

use super::parse_number;
use crate::model::CheckKind;

pub(super) fn check(kind: CheckKind, threshold: &str, value: &str) -> Result<bool, String> {
    let threshold = parse_number(threshold, "threshold")?;
    let value = parse_number(value, "value")?;

    Ok(match kind {
        CheckKind::MeasurementMax => value > threshold,
        CheckKind::MeasurementMin => value < threshold,
        _ => false,
    })
}
