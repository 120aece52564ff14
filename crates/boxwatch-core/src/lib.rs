//! Health checks and change notifications for openSenseMap boxes.
//!
//! This crate owns the domain model and the three pieces that give the
//! notifier its edge-triggered behavior:
//!
//! - **Check engine** ([`checks::evaluate`]) turns a box snapshot and its
//!   rules into typed OK/FAILED [`CheckResult`]s. Pure, no I/O.
//!
//! - **[`ResultCache`]** remembers the last status of every rule instance
//!   (keyed by [`EventId`]) across restarts, so only changes are reported.
//!
//! - **[`Dispatcher`]** diffs results against the cache, composes one
//!   [`Notification`] per box, submits it through the [`NotifierRegistry`]
//!   with retries and records the new state only after delivery succeeded.
//!
//! [`runner::evaluate`] fetches boxes through a [`BoxSource`] and
//! [`watch::watch`] repeats whole cycles on an interval.

pub mod cache;
pub mod checks;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod notify;
pub mod runner;
pub mod summary;
pub mod watch;

// ── Primary re-exports ──────────────────────────────────────────────
pub use boxwatch_api::BoxFilters;
pub use cache::{CacheEntry, Change, ResultCache};
pub use dispatch::{DispatchReport, Dispatcher, RetryPolicy};
pub use error::CoreError;
pub use notify::email::{EmailTransport, SmtpSettings};
pub use notify::slack::SlackTransport;
pub use notify::{Notification, Notifier, NotifierRegistry, Transport};
pub use runner::{BoxConfigs, BoxSource};
pub use summary::{RunSummary, log_results};

pub use model::{
    BoxCheckResults, BoxEvaluation, BoxFailure, BoxSummary, CheckKind, CheckResult, CheckStatus,
    EmailOptions, EventId, LastMeasurement, NotifyConfig, NotifyEvent, SenseBox, Sensor,
    StatusFilter, TARGET_ALL, TransportConfig, TransportKind,
};
