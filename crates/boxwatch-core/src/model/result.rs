// ── Check results ──

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strum::{Display, EnumString};

use super::rule::{CheckKind, NotifyConfig};
use super::sensebox::SenseBox;
use crate::error::CoreError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum CheckStatus {
    #[serde(rename = "OK")]
    #[strum(serialize = "OK")]
    Ok,
    #[serde(rename = "FAILED")]
    #[strum(serialize = "FAILED")]
    Failed,
}

/// Stable identifier of a rule instance: hex SHA-256 over
/// (type, target, threshold). The observed value is not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(kind: CheckKind, target: &str, threshold: &str) -> Self {
        // Unit separators keep ("ab", "c") and ("a", "bc") apart.
        let digest = Sha256::digest(format!("{kind}\u{1f}{target}\u{1f}{threshold}").as_bytes());
        Self(format!("{digest:x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of one rule on one sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    #[serde(rename = "type")]
    pub kind: CheckKind,
    /// Sensor id.
    pub target: String,
    /// Sensor phenomenon.
    pub target_name: String,
    pub value: String,
    /// Echoed from the rule.
    pub threshold: String,
}

impl CheckResult {
    pub fn event_id(&self) -> EventId {
        EventId::new(self.kind, &self.target, &self.threshold)
    }

    pub fn is_failed(&self) -> bool {
        self.status == CheckStatus::Failed
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, id, value) = (&self.target_name, &self.target, &self.value);
        if self.status == CheckStatus::Ok {
            return write!(
                f,
                "{} OK (on sensor {name} ({id}) with value {value})",
                self.kind
            );
        }
        match self.kind {
            CheckKind::MeasurementAge => write!(f, "No measurement from {name} ({id}) since {value}"),
            CheckKind::MeasurementMin => write!(f, "Sensor {name} ({id}) reads low value of {value}"),
            CheckKind::MeasurementMax => write!(f, "Sensor {name} ({id}) reads high value of {value}"),
            CheckKind::MeasurementFaulty => write!(
                f,
                "Sensor {name} ({id}) reads presumably faulty value of {value}"
            ),
        }
    }
}

// ── Status filter ───────────────────────────────────────────────────

/// Which statuses are eligible for notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Error,
    Ok,
}

impl StatusFilter {
    pub fn admits(self, status: CheckStatus) -> bool {
        match self {
            Self::All => true,
            Self::Error => status == CheckStatus::Failed,
            Self::Ok => status == CheckStatus::Ok,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "error" | "err" => Ok(Self::Error),
            "ok" => Ok(Self::Ok),
            other => Err(CoreError::configuration(format!(
                "invalid notify value '{other}', expected one of: all, error, ok"
            ))),
        }
    }
}

impl TryFrom<String> for StatusFilter {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, CoreError> {
        value.parse()
    }
}

impl From<StatusFilter> for String {
    fn from(filter: StatusFilter) -> Self {
        filter.to_string()
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Error => "error",
            Self::Ok => "ok",
        })
    }
}

// ── Per-run snapshot ────────────────────────────────────────────────

/// One evaluated box with its results, in engine order.
#[derive(Debug, Clone)]
pub struct BoxEvaluation {
    pub sensebox: SenseBox,
    pub results: Vec<CheckResult>,
}

impl BoxEvaluation {
    pub fn config(&self) -> Option<&NotifyConfig> {
        self.sensebox.notify.as_ref()
    }

    pub fn failed(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| r.is_failed())
    }
}

/// A box that could not be evaluated or notified.
#[derive(Debug, Clone)]
pub struct BoxFailure {
    pub box_id: String,
    pub error: CoreError,
}

impl BoxFailure {
    /// Fold per-box failures into one run-level error.
    pub fn aggregate(failures: &[BoxFailure]) -> Result<(), CoreError> {
        if failures.is_empty() {
            return Ok(());
        }
        let details = failures
            .iter()
            .map(|f| format!("  {}: {}", f.box_id, f.error))
            .collect::<Vec<_>>()
            .join("\n");
        Err(CoreError::BoxesFailed {
            failed: failures.len(),
            details,
        })
    }
}

/// Results of one evaluation run, keyed by box id in input order.
#[derive(Debug, Clone, Default)]
pub struct BoxCheckResults {
    boxes: IndexMap<String, BoxEvaluation>,
    failures: Vec<BoxFailure>,
}

impl BoxCheckResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, evaluation: BoxEvaluation) {
        self.boxes.insert(evaluation.sensebox.id.clone(), evaluation);
    }

    pub fn record_failure(&mut self, box_id: impl Into<String>, error: CoreError) {
        self.failures.push(BoxFailure {
            box_id: box_id.into(),
            error,
        });
    }

    pub fn get(&self, box_id: &str) -> Option<&BoxEvaluation> {
        self.boxes.get(box_id)
    }

    pub fn boxes(&self) -> impl Iterator<Item = &BoxEvaluation> {
        self.boxes.values()
    }

    pub fn failures(&self) -> &[BoxFailure] {
        &self.failures
    }

    /// Number of successfully evaluated boxes.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Total results across all boxes.
    pub fn result_count(&self) -> usize {
        self.boxes.values().map(|b| b.results.len()).sum()
    }

    /// `Err` with an aggregate message when any box failed to evaluate.
    pub fn ensure_success(&self) -> Result<(), CoreError> {
        BoxFailure::aggregate(&self.failures)
    }
}
