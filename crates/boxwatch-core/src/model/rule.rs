// ── Rule configuration types ──
//
// A `NotifyConfig` is supplied per box by the configuration layer and is
// read-only to the core. Event types are kept as raw strings so that an
// unknown type survives loading and is reported during evaluation.

use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Wildcard target matching every sensor of a box.
pub const TARGET_ALL: &str = "all";

/// The check types the engine knows how to evaluate.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckKind {
    MeasurementAge,
    MeasurementMin,
    MeasurementMax,
    MeasurementFaulty,
}

/// One configured rule: type + target + threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub target: String,
    /// Duration for `measurement_age`, number for min/max, unused otherwise.
    #[serde(default, deserialize_with = "threshold_text")]
    pub threshold: String,
}

/// Accept `threshold = 40` as well as `threshold = "40"`.
fn threshold_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Threshold {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match Threshold::deserialize(d)? {
        Threshold::Text(s) => s,
        Threshold::Integer(n) => n.to_string(),
        Threshold::Float(n) => n.to_string(),
    })
}

impl NotifyEvent {
    pub fn new(kind: CheckKind, target: impl Into<String>, threshold: impl Into<String>) -> Self {
        Self {
            event_type: kind.to_string(),
            target: target.into(),
            threshold: threshold.into(),
        }
    }

    /// The parsed check kind, or `None` for an unknown type.
    pub fn kind(&self) -> Option<CheckKind> {
        self.event_type.parse().ok()
    }

    pub fn applies_to(&self, sensor_id: &str) -> bool {
        self.target == TARGET_ALL || self.target == sensor_id
    }
}

// ── Transports ──────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransportKind {
    Email,
    Slack,
}

/// Transport selection plus its options, validated when configuration loads.
///
/// In TOML: `notifications = { transport = "email", options = { recipients = [...] } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transport", content = "options", rename_all = "lowercase")]
pub enum TransportConfig {
    Email(EmailOptions),
    Slack,
}

impl TransportConfig {
    pub fn kind(&self) -> TransportKind {
        match self {
            Self::Email(_) => TransportKind::Email,
            Self::Slack => TransportKind::Slack,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailOptions {
    pub recipients: Vec<String>,
}

/// Transport + ordered rules for one box.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<TransportConfig>,
    #[serde(default)]
    pub events: Vec<NotifyEvent>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn check_kind_names() {
        assert_eq!(CheckKind::MeasurementAge.to_string(), "measurement_age");
        assert_eq!(
            "measurement_faulty".parse::<CheckKind>().unwrap(),
            CheckKind::MeasurementFaulty
        );
        assert!("measurement_median".parse::<CheckKind>().is_err());
    }

    #[test]
    fn event_targets() {
        let all = NotifyEvent::new(CheckKind::MeasurementMax, TARGET_ALL, "40");
        let one = NotifyEvent::new(CheckKind::MeasurementMax, "s1", "40");
        assert!(all.applies_to("s2"));
        assert!(one.applies_to("s1"));
        assert!(!one.applies_to("s2"));
    }

    #[test]
    fn transport_config_from_json() {
        let email: TransportConfig = serde_json::from_str(
            r#"{"transport": "email", "options": {"recipients": ["a@example.org"]}}"#,
        )
        .unwrap();
        assert_eq!(email.kind(), TransportKind::Email);

        let slack: TransportConfig = serde_json::from_str(r#"{"transport": "slack"}"#).unwrap();
        assert_eq!(slack, TransportConfig::Slack);

        let unknown = serde_json::from_str::<TransportConfig>(r#"{"transport": "xmpp"}"#);
        assert!(unknown.is_err());
    }

    #[test]
    fn numeric_threshold() {
        let event: NotifyEvent =
            serde_json::from_str(r#"{"type": "measurement_max", "target": "all", "threshold": 40}"#)
                .unwrap();
        assert_eq!(event.threshold, "40");
        assert_eq!(event.kind(), Some(CheckKind::MeasurementMax));

        let event: NotifyEvent =
            serde_json::from_str(r#"{"type": "measurement_faulty", "target": "all"}"#).unwrap();
        assert_eq!(event.threshold, "");
    }
}
