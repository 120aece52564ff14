// ── Check engine ──
//
// Pure evaluation of a box snapshot against its rules. No I/O; the only
// ambient input is `now`, passed in by the caller. A rule that cannot be
// evaluated on one sensor (bad threshold, unparseable value, unknown
// type) is logged and skipped without affecting the others.

mod age;
mod faulty;
mod threshold;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::CoreError;
use crate::model::{
    CheckKind, CheckResult, CheckStatus, LastMeasurement, NotifyConfig, NotifyEvent, SenseBox,
    Sensor,
};

pub use faulty::is_known_faulty;

/// Evaluate every rule of `config` against every sensor of `sensebox`.
///
/// Results are ordered by rule, then by sensor. Sensors that never
/// reported are skipped for every rule.
pub fn evaluate(
    sensebox: &SenseBox,
    config: &NotifyConfig,
    now: DateTime<Utc>,
) -> Vec<CheckResult> {
    let mut results = Vec::new();

    for event in &config.events {
        let Some(kind) = event.kind() else {
            warn!(
                box_id = %sensebox.id,
                event = %event.event_type,
                "ignoring unknown check type"
            );
            continue;
        };

        for sensor in &sensebox.sensors {
            let Some(measurement) = sensor.last_measurement.as_ref() else {
                continue;
            };
            if !event.applies_to(&sensor.id) {
                continue;
            }

            match check(kind, event, sensor, measurement, now) {
                Ok(result) => results.push(result),
                Err(e) => warn!(box_id = %sensebox.id, sensor = %sensor.id, "{e}"),
            }
        }
    }

    results
}

fn check(
    kind: CheckKind,
    event: &NotifyEvent,
    sensor: &Sensor,
    measurement: &LastMeasurement,
    now: DateTime<Utc>,
) -> Result<CheckResult, CoreError> {
    let (failed, value) = match kind {
        CheckKind::MeasurementAge => age::check(&event.threshold, measurement, now)
            .map(|failed| (failed, measurement.created_at.to_rfc3339())),
        CheckKind::MeasurementMin | CheckKind::MeasurementMax => {
            threshold::check(kind, &event.threshold, &measurement.value)
                .map(|failed| (failed, measurement.value.clone()))
        }
        CheckKind::MeasurementFaulty => faulty::check(&sensor.sensor_type, &measurement.value)
            .map(|failed| (failed, measurement.value.clone())),
    }
    .map_err(|message| CoreError::Evaluation {
        kind: kind.to_string(),
        target: sensor.id.clone(),
        message,
    })?;

    Ok(CheckResult {
        status: if failed { CheckStatus::Failed } else { CheckStatus::Ok },
        kind,
        target: sensor.id.clone(),
        target_name: sensor.phenomenon.clone(),
        value,
        threshold: event.threshold.clone(),
    })
}

/// Parse a reported or configured number.
fn parse_number(raw: &str, what: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid {what} '{raw}': {e}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::TARGET_ALL;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn sensor(id: &str, sensor_type: &str, value: &str, age_minutes: i64) -> Sensor {
        Sensor {
            id: id.into(),
            phenomenon: format!("phenomenon-{id}"),
            sensor_type: sensor_type.into(),
            unit: None,
            last_measurement: Some(LastMeasurement {
                value: value.into(),
                created_at: now() - Duration::minutes(age_minutes),
            }),
        }
    }

    fn sensebox(sensors: Vec<Sensor>) -> SenseBox {
        SenseBox {
            id: "593bcd656ccf3b0011791f5a".into(),
            name: "Balkon".into(),
            sensors,
            notify: None,
        }
    }

    fn config(events: Vec<NotifyEvent>) -> NotifyConfig {
        NotifyConfig {
            notifications: None,
            events,
        }
    }

    fn statuses(results: &[CheckResult]) -> Vec<(&str, CheckKind, CheckStatus)> {
        results
            .iter()
            .map(|r| (r.target.as_str(), r.kind, r.status))
            .collect()
    }

    #[test]
    fn measurement_age() {
        let b = sensebox(vec![sensor("old", "HDC1008", "20", 20), sensor("new", "HDC1008", "20", 5)]);
        let c = config(vec![NotifyEvent::new(CheckKind::MeasurementAge, TARGET_ALL, "15m")]);

        let results = evaluate(&b, &c, now());
        assert_eq!(
            statuses(&results),
            vec![
                ("old", CheckKind::MeasurementAge, CheckStatus::Failed),
                ("new", CheckKind::MeasurementAge, CheckStatus::Ok),
            ]
        );
        assert_eq!(results[0].value, (now() - Duration::minutes(20)).to_rfc3339());
        assert_eq!(results[0].threshold, "15m");
    }

    #[test]
    fn measurement_min_max() {
        let b = sensebox(vec![sensor("hot", "HDC1008", "41", 1), sensor("mild", "HDC1008", "39", 1)]);
        let c = config(vec![
            NotifyEvent::new(CheckKind::MeasurementMax, TARGET_ALL, "40"),
            NotifyEvent::new(CheckKind::MeasurementMin, TARGET_ALL, "40"),
        ]);

        assert_eq!(
            statuses(&evaluate(&b, &c, now())),
            vec![
                ("hot", CheckKind::MeasurementMax, CheckStatus::Failed),
                ("mild", CheckKind::MeasurementMax, CheckStatus::Ok),
                ("hot", CheckKind::MeasurementMin, CheckStatus::Ok),
                ("mild", CheckKind::MeasurementMin, CheckStatus::Failed),
            ]
        );
    }

    #[test]
    fn measurement_faulty() {
        let b = sensebox(vec![
            sensor("zero", "HDC1008", "0.00", 1),
            sensor("fine", "HDC1008", "5.0", 1),
            sensor("cold", "HDC1008", "-40", 1),
            sensor("pm", "SDS 011", "0", 1),
            sensor("other", "BME680", "0.0", 1),
        ]);
        let c = config(vec![NotifyEvent::new(CheckKind::MeasurementFaulty, TARGET_ALL, "")]);

        let results = evaluate(&b, &c, now());
        let failed: Vec<_> = results.iter().filter(|r| r.is_failed()).map(|r| r.target.as_str()).collect();
        assert_eq!(failed, vec!["zero", "cold", "pm"]);
        assert_eq!(results.len(), 5);
    }

    #[test]
    fn never_measured_sensor_is_skipped() {
        let mut silent = sensor("silent", "HDC1008", "0", 0);
        silent.last_measurement = None;
        let b = sensebox(vec![silent]);
        let c = config(vec![
            NotifyEvent::new(CheckKind::MeasurementAge, TARGET_ALL, "15m"),
            NotifyEvent::new(CheckKind::MeasurementFaulty, TARGET_ALL, ""),
            NotifyEvent::new(CheckKind::MeasurementMax, TARGET_ALL, "1"),
        ]);

        assert!(evaluate(&b, &c, now()).is_empty());
    }

    #[test]
    fn target_selects_single_sensor() {
        let b = sensebox(vec![sensor("a", "HDC1008", "50", 1), sensor("b", "HDC1008", "50", 1)]);
        let c = config(vec![NotifyEvent::new(CheckKind::MeasurementMax, "b", "40")]);

        assert_eq!(
            statuses(&evaluate(&b, &c, now())),
            vec![("b", CheckKind::MeasurementMax, CheckStatus::Failed)]
        );
    }

    #[test]
    fn malformed_thresholds_skip_only_that_check() {
        let b = sensebox(vec![sensor("a", "HDC1008", "50", 30), sensor("b", "HDC1008", "n/a", 1)]);
        let c = config(vec![
            NotifyEvent::new(CheckKind::MeasurementAge, TARGET_ALL, "fifteen minutes"),
            NotifyEvent::new(CheckKind::MeasurementMax, TARGET_ALL, "forty"),
            NotifyEvent::new(CheckKind::MeasurementMin, TARGET_ALL, "10"),
        ]);

        // "b" has an unparseable value, so only "a" yields a min result.
        assert_eq!(
            statuses(&evaluate(&b, &c, now())),
            vec![("a", CheckKind::MeasurementMin, CheckStatus::Ok)]
        );
    }

    #[test]
    fn unknown_event_type_is_ignored() {
        let b = sensebox(vec![sensor("a", "HDC1008", "50", 1)]);
        let c = config(vec![
            NotifyEvent {
                event_type: "measurement_median".into(),
                target: TARGET_ALL.into(),
                threshold: "3".into(),
            },
            NotifyEvent::new(CheckKind::MeasurementMax, TARGET_ALL, "40"),
        ]);

        assert_eq!(
            statuses(&evaluate(&b, &c, now())),
            vec![("a", CheckKind::MeasurementMax, CheckStatus::Failed)]
        );
    }

    #[test]
    fn event_ids_are_stable_across_runs() {
        let c = config(vec![NotifyEvent::new(CheckKind::MeasurementMax, TARGET_ALL, "40")]);
        let first = evaluate(&sensebox(vec![sensor("a", "HDC1008", "41", 1)]), &c, now());
        let second = evaluate(&sensebox(vec![sensor("a", "HDC1008", "12", 3)]), &c, now());

        assert_ne!(first[0].status, second[0].status);
        assert_eq!(first[0].event_id(), second[0].event_id());
    }
}
