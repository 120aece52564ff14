// ── Domain model ──
//
// Canonical types the check engine, cache and dispatcher operate on.
// API wire shapes are converted into these in `crate::convert`.

pub mod result;
pub mod rule;
pub mod sensebox;

// ── Re-exports ──────────────────────────────────────────────────────

pub use result::{
    BoxCheckResults, BoxEvaluation, BoxFailure, CheckResult, CheckStatus, EventId, StatusFilter,
};
pub use rule::{
    CheckKind, EmailOptions, NotifyConfig, NotifyEvent, TARGET_ALL, TransportConfig, TransportKind,
};
pub use sensebox::{BoxSummary, LastMeasurement, SenseBox, Sensor};
