// ── Core error types ──
//
// User-facing errors from boxwatch-core, grouped by the stage that
// produced them. Consumers never see HTTP status codes or JSON parse
// failures directly; the `From<boxwatch_api::Error>` impl translates
// transport-layer errors into fetch variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Fetch errors (abort one box) ─────────────────────────────────
    #[error("Cannot connect to API at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("API request timed out")]
    Timeout,

    #[error("Box not found: {identifier}")]
    BoxNotFound { identifier: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors (fatal for one box) ─────────────────────
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // ── Evaluation errors (skip one check) ───────────────────────────
    #[error("Cannot evaluate {kind} on sensor {target}: {message}")]
    Evaluation {
        kind: String,
        target: String,
        message: String,
    },

    // ── Delivery errors ──────────────────────────────────────────────
    #[error("Delivery via {transport} failed: {message}")]
    Delivery { transport: String, message: String },

    #[error("Delivery via {transport} failed after {attempts} attempts: {message}")]
    DeliveryExhausted {
        transport: String,
        attempts: u32,
        message: String,
    },

    // ── Cache errors (best-effort) ───────────────────────────────────
    #[error("Cache file {path}: {message}")]
    CacheIo { path: String, message: String },

    // ── Run-level aggregate ──────────────────────────────────────────
    #[error("{failed} box(es) failed:\n{details}")]
    BoxesFailed { failed: usize, details: String },
}

impl CoreError {
    /// Returns `true` for errors raised while fetching box data.
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::Timeout | Self::BoxNotFound { .. } | Self::Api { .. }
        )
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<boxwatch_api::Error> for CoreError {
    fn from(err: boxwatch_api::Error) -> Self {
        let not_found = err.is_not_found();
        match err {
            boxwatch_api::Error::Api { message, .. } if not_found => CoreError::BoxNotFound {
                identifier: message,
            },
            boxwatch_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            boxwatch_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            boxwatch_api::Error::InvalidUrl(e) => CoreError::Configuration {
                message: format!("Invalid URL: {e}"),
            },
            boxwatch_api::Error::ClientBuild(message) => CoreError::Configuration { message },
            boxwatch_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("unexpected response: {message}"),
                status: None,
            },
        }
    }
}
