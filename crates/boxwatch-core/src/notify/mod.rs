// ── Notifications ──
//
// Composition of the per-box notification text and the transport seam.
// Concrete transports live in `email` and `slack`; the dispatcher only
// sees them through `NotifierRegistry`.

pub mod email;
mod registry;
pub mod slack;

use std::fmt::Write as _;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

use crate::cache::Change;
use crate::model::{CheckResult, CheckStatus, SenseBox};

pub use registry::{Notifier, NotifierRegistry, Transport};

const EXPLORE_URL: &str = "https://opensensemap.org/explore";
const SIGNATURE: &str = "Sent automatically by boxwatch";

/// A composed message, ready for any transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// FAILED while any new issue is listed, OK otherwise.
    pub status: CheckStatus,
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Build the notification for one box from its due changes.
    ///
    /// FAILED results are new issues. OK results are resolved when the
    /// cache last saw them FAILED; OK results without a known previous
    /// state are listed as passing.
    pub fn compose(sensebox: &SenseBox, due: &[Change<'_>], now: DateTime<Utc>) -> Self {
        let mut issues = Vec::new();
        let mut resolved = Vec::new();
        let mut passing = Vec::new();
        for change in due {
            if change.result.is_failed() {
                issues.push(change.result);
            } else if change.is_resolution() {
                resolved.push(change.result);
            } else {
                passing.push(change.result);
            }
        }

        let status = if issues.is_empty() {
            CheckStatus::Ok
        } else {
            CheckStatus::Failed
        };
        let subject = if !issues.is_empty() {
            format!("Issues with your box \"{}\" on opensensemap.org!", sensebox.name)
        } else if !resolved.is_empty() {
            format!(
                "Issues resolved with your box \"{}\" on opensensemap.org!",
                sensebox.name
            )
        } else {
            format!(
                "All checks passing for your box \"{}\" on opensensemap.org!",
                sensebox.name
            )
        };

        let checked_at = now.duration_round(TimeDelta::minutes(1)).unwrap_or(now);
        let mut body = format!(
            "A check at {} identified the following updates for your box \"{}\":\n\n",
            checked_at.format("%Y-%m-%d %H:%M UTC"),
            sensebox.name
        );
        push_section(&mut body, "New issue(s)", &issues);
        push_section(&mut body, "Resolved issue(s)", &resolved);
        push_section(&mut body, "Passing check(s)", &passing);
        let _ = write!(
            body,
            "You may visit {EXPLORE_URL}/{} for more details.\n\n--\n{SIGNATURE}",
            sensebox.id
        );

        Self {
            status,
            subject,
            body,
        }
    }

    /// A message used to verify a transport end to end.
    pub fn test(host: &str) -> Self {
        Self {
            status: CheckStatus::Ok,
            subject: "Test notification from openSenseMap notifier".into(),
            body: format!("Your notification set up on {host} is working fine!"),
        }
    }
}

fn push_section(body: &mut String, title: &str, results: &[&CheckResult]) {
    if results.is_empty() {
        return;
    }
    let _ = writeln!(body, "{title}:\n");
    for r in results {
        let _ = writeln!(body, "{r}");
    }
    body.push('\n');
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::CheckKind;

    fn sensebox() -> SenseBox {
        SenseBox {
            id: "593bcd656ccf3b0011791f5a".into(),
            name: "Balkon".into(),
            sensors: vec![],
            notify: None,
        }
    }

    fn result(target: &str, status: CheckStatus) -> CheckResult {
        CheckResult {
            status,
            kind: CheckKind::MeasurementMax,
            target: target.into(),
            target_name: "Temperatur".into(),
            value: "41".into(),
            threshold: "40".into(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 31).unwrap()
    }

    fn change(result: &CheckResult, previous: Option<CheckStatus>) -> Change<'_> {
        Change { result, previous }
    }

    #[test]
    fn new_and_resolved_sections() {
        let failed = result("s1", CheckStatus::Failed);
        let ok = result("s2", CheckStatus::Ok);
        let due = [
            change(&failed, None),
            change(&ok, Some(CheckStatus::Failed)),
        ];
        let n = Notification::compose(&sensebox(), &due, now());

        assert_eq!(n.status, CheckStatus::Failed);
        assert_eq!(n.subject, "Issues with your box \"Balkon\" on opensensemap.org!");
        assert_eq!(
            n.body,
            "A check at 2024-06-15 12:01 UTC identified the following updates for your box \"Balkon\":\n\n\
             New issue(s):\n\n\
             Sensor Temperatur (s1) reads high value of 41\n\n\
             Resolved issue(s):\n\n\
             measurement_max OK (on sensor Temperatur (s2) with value 41)\n\n\
             You may visit https://opensensemap.org/explore/593bcd656ccf3b0011791f5a for more details.\n\n\
             --\nSent automatically by boxwatch"
        );
    }

    #[test]
    fn only_resolved_is_ok() {
        let ok = result("s2", CheckStatus::Ok);
        let due = [change(&ok, Some(CheckStatus::Failed))];
        let n = Notification::compose(&sensebox(), &due, now());

        assert_eq!(n.status, CheckStatus::Ok);
        assert_eq!(
            n.subject,
            "Issues resolved with your box \"Balkon\" on opensensemap.org!"
        );
        assert!(!n.body.contains("New issue(s)"));
        assert!(n.body.contains("Resolved issue(s):\n\n"));
    }

    #[test]
    fn first_seen_ok_is_passing_not_resolved() {
        let resolved = result("s1", CheckStatus::Ok);
        let fresh = result("s2", CheckStatus::Ok);
        let due = [
            change(&resolved, Some(CheckStatus::Failed)),
            change(&fresh, None),
        ];
        let n = Notification::compose(&sensebox(), &due, now());

        assert_eq!(n.status, CheckStatus::Ok);
        assert!(n.body.contains(
            "Resolved issue(s):\n\nmeasurement_max OK (on sensor Temperatur (s1) with value 41)\n\n"
        ));
        assert!(n.body.contains(
            "Passing check(s):\n\nmeasurement_max OK (on sensor Temperatur (s2) with value 41)\n\n"
        ));

        let n = Notification::compose(&sensebox(), &due[1..], now());
        assert_eq!(
            n.subject,
            "All checks passing for your box \"Balkon\" on opensensemap.org!"
        );
        assert!(!n.body.contains("Resolved issue(s)"));
    }
}
