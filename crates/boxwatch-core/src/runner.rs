// ── Evaluation runner ──
//
// Fetches every requested box, attaches its rule configuration and runs
// the check engine. A box that cannot be fetched or has no usable
// configuration is recorded as a failure; the others still run.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::{debug, error, info};

use boxwatch_api::{BoxFilters, OsemClient};

use crate::checks;
use crate::error::CoreError;
use crate::model::{BoxCheckResults, BoxEvaluation, BoxSummary, NotifyConfig, SenseBox};

/// Per-box rule configuration, already merged by the config layer, in the
/// order the boxes should be checked.
pub type BoxConfigs = IndexMap<String, Result<NotifyConfig, CoreError>>;

/// Where box snapshots come from.
#[async_trait]
pub trait BoxSource: Send + Sync {
    async fn get_box(&self, box_id: &str) -> Result<SenseBox, CoreError>;

    async fn get_all_boxes(&self, filters: &BoxFilters) -> Result<Vec<BoxSummary>, CoreError>;
}

#[async_trait]
impl BoxSource for OsemClient {
    async fn get_box(&self, box_id: &str) -> Result<SenseBox, CoreError> {
        let raw = OsemClient::get_box(self, box_id)
            .await
            .map_err(|e| match CoreError::from(e) {
                CoreError::BoxNotFound { .. } => CoreError::BoxNotFound {
                    identifier: box_id.to_owned(),
                },
                other => other,
            })?;
        Ok(SenseBox::from(raw))
    }

    async fn get_all_boxes(&self, filters: &BoxFilters) -> Result<Vec<BoxSummary>, CoreError> {
        let boxes = OsemClient::get_all_boxes(self, filters).await?;
        Ok(boxes.into_iter().map(BoxSummary::from).collect())
    }
}

/// Evaluate every box in `configs` at time `now`.
pub async fn evaluate(
    source: &dyn BoxSource,
    configs: &BoxConfigs,
    now: DateTime<Utc>,
) -> BoxCheckResults {
    debug!("checking {} box(es)", configs.len());
    let mut results = BoxCheckResults::new();

    for (box_id, config) in configs {
        info!(box_id = %box_id, "checking box for events");

        let config = match config {
            Ok(config) => config,
            Err(e) => {
                error!(box_id = %box_id, "{e}");
                results.record_failure(box_id.clone(), e.clone());
                continue;
            }
        };

        let mut sensebox = match source.get_box(box_id).await {
            Ok(sensebox) => sensebox,
            Err(e) => {
                error!(box_id = %box_id, "could not fetch box: {e}");
                results.record_failure(box_id.clone(), e);
                continue;
            }
        };

        let box_results = checks::evaluate(&sensebox, config, now);
        sensebox.notify = Some(config.clone());
        results.insert(BoxEvaluation {
            sensebox,
            results: box_results,
        });
    }

    results
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use chrono::Duration;

    use super::*;
    use crate::model::{CheckKind, LastMeasurement, NotifyEvent, Sensor, TARGET_ALL};

    /// In-memory box source keyed by id.
    struct FixedSource(HashMap<String, SenseBox>);

    #[async_trait]
    impl BoxSource for FixedSource {
        async fn get_box(&self, box_id: &str) -> Result<SenseBox, CoreError> {
            self.0
                .get(box_id)
                .cloned()
                .ok_or_else(|| CoreError::BoxNotFound {
                    identifier: box_id.to_owned(),
                })
        }

        async fn get_all_boxes(&self, _filters: &BoxFilters) -> Result<Vec<BoxSummary>, CoreError> {
            Ok(self
                .0
                .values()
                .map(|b| BoxSummary {
                    id: b.id.clone(),
                    name: b.name.clone(),
                })
                .collect())
        }
    }

    fn sensebox(id: &str, now: DateTime<Utc>) -> SenseBox {
        SenseBox {
            id: id.into(),
            name: format!("box {id}"),
            sensors: vec![Sensor {
                id: "s1".into(),
                phenomenon: "Temperatur".into(),
                sensor_type: "HDC1008".into(),
                unit: Some("°C".into()),
                last_measurement: Some(LastMeasurement {
                    value: "21.5".into(),
                    created_at: now - Duration::hours(2),
                }),
            }],
            notify: None,
        }
    }

    fn age_config() -> NotifyConfig {
        NotifyConfig {
            notifications: None,
            events: vec![NotifyEvent::new(CheckKind::MeasurementAge, TARGET_ALL, "15m")],
        }
    }

    #[tokio::test]
    async fn failing_boxes_do_not_abort_the_run() {
        let now = Utc::now();
        let source = FixedSource(HashMap::from([
            ("a".to_owned(), sensebox("a", now)),
            ("c".to_owned(), sensebox("c", now)),
        ]));
        let configs: BoxConfigs = IndexMap::from([
            ("a".to_owned(), Ok(age_config())),
            ("missing".to_owned(), Ok(age_config())),
            (
                "b".to_owned(),
                Err(CoreError::Configuration {
                    message: "bad transport".into(),
                }),
            ),
            ("c".to_owned(), Ok(age_config())),
        ]);

        let results = evaluate(&source, &configs, now).await;

        assert_eq!(results.len(), 2);
        let ids: Vec<_> = results.boxes().map(|b| b.sensebox.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(results.result_count(), 2);
        assert!(results.get("a").unwrap().results[0].is_failed());
        assert_eq!(results.get("a").unwrap().config(), Some(&age_config()));

        let failed: Vec<_> = results.failures().iter().map(|f| f.box_id.as_str()).collect();
        assert_eq!(failed, vec!["missing", "b"]);
        assert!(results.failures()[0].error.is_fetch());
        assert!(results.ensure_success().is_err());
    }
}
