// ── Run summary ──
//
// Human readable log of a run's results, plus counts for the caller.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::model::{BoxCheckResults, CheckKind};

/// Counts for one evaluation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Boxes requested.
    pub checked: usize,
    /// Boxes that could not be evaluated.
    pub skipped: usize,
    /// Evaluated boxes without a FAILED result.
    pub ok: usize,
    /// Evaluated boxes with at least one FAILED result.
    pub err: usize,
    pub failures_by_kind: BTreeMap<CheckKind, usize>,
}

impl RunSummary {
    pub fn from_results(results: &BoxCheckResults) -> Self {
        let mut summary = Self {
            checked: results.len() + results.failures().len(),
            skipped: results.failures().len(),
            ..Self::default()
        };
        for evaluation in results.boxes() {
            let mut failed = false;
            for r in evaluation.failed() {
                failed = true;
                *summary.failures_by_kind.entry(r.kind).or_default() += 1;
            }
            if failed {
                summary.err += 1;
            } else {
                summary.ok += 1;
            }
        }
        summary
    }
}

/// Log every result (OK at debug, FAILED at warn) and a run summary.
pub fn log_results(results: &BoxCheckResults) -> RunSummary {
    for evaluation in results.boxes() {
        let sensebox = &evaluation.sensebox;
        let mut failed = 0;
        for r in &evaluation.results {
            if r.is_failed() {
                failed += 1;
                warn!(
                    box_id = %sensebox.id,
                    status = %r.status,
                    event = %r.kind,
                    value = %r.value,
                    target = %r.target,
                    "{}: {r}",
                    sensebox.name
                );
            } else {
                debug!(
                    box_id = %sensebox.id,
                    status = %r.status,
                    event = %r.kind,
                    value = %r.value,
                    target = %r.target,
                    "{}: {r}",
                    sensebox.name
                );
            }
        }
        if failed == 0 {
            info!(box_id = %sensebox.id, "{}: all is fine!", sensebox.name);
        }
    }

    let summary = RunSummary::from_results(results);
    let by_kind = summary
        .failures_by_kind
        .iter()
        .map(|(kind, n)| format!("{kind}={n}"))
        .collect::<Vec<_>>()
        .join(" ");
    info!(
        checked = summary.checked,
        skipped = summary.skipped,
        ok = summary.ok,
        err = summary.err,
        failures = %by_kind,
        "boxes checked: {}, skipped: {}, ok: {}, with issues: {}",
        summary.checked,
        summary.skipped,
        summary.ok,
        summary.err
    );
    summary
}
