//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use boxwatch_config::ConfigError;
use boxwatch_core::CoreError;

/// Process exit codes; 0 is success.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to the openSenseMap API at {url}")]
    #[diagnostic(
        code(boxwatch::connection_failed),
        help(
            "Check your network connection and the API root.\n\
             Reason: {reason}\n\
             Try: boxwatch --api https://api.opensensemap.org ..."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to the openSenseMap API timed out")]
    #[diagnostic(code(boxwatch::timeout), help("The API may be overloaded; try again later."))]
    Timeout,

    // ── API ──────────────────────────────────────────────────────────

    #[error("Box '{identifier}' not found")]
    #[diagnostic(
        code(boxwatch::not_found),
        help("Box ids can be looked up on https://opensensemap.org/explore")
    )]
    BoxNotFound { identifier: String },

    #[error("API error: {message}")]
    #[diagnostic(code(boxwatch::api_error))]
    ApiError { message: String },

    // ── Run ──────────────────────────────────────────────────────────

    #[error("{failed} box(es) failed")]
    #[diagnostic(code(boxwatch::run_failed), help("{details}"))]
    RunFailed { failed: usize, details: String },

    #[error("Notification via {transport} failed: {message}")]
    #[diagnostic(
        code(boxwatch::delivery),
        help("Verify the [{transport}] section with: boxwatch debug notifications")
    )]
    Delivery { transport: String, message: String },

    #[error("Cache file {path}: {message}")]
    #[diagnostic(
        code(boxwatch::cache),
        help("Point --cache-file at a writable location, or pass --no-cache.")
    )]
    Cache { path: String, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(boxwatch::validation))]
    Validation { field: String, reason: String },

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(boxwatch::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(boxwatch::config),
        help("Run: boxwatch config help for an annotated sample configuration")
    )]
    Config { message: String },

    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(boxwatch::no_config),
        help("Check the --config path, or omit it to use the default location.")
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(boxwatch::config))]
    Figment(Box<figment::Error>),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(boxwatch::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout => exit_code::CONNECTION,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::Config { .. } | Self::NoConfig { .. } | Self::Figment(_) => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { path } => CliError::NoConfig {
                path: path.display().to_string(),
            },
            ConfigError::Validation { field, reason } => CliError::Config {
                message: format!("invalid {field}: {reason}"),
            },
            ConfigError::Figment(e) => CliError::Figment(e),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::Timeout => CliError::Timeout,

            CoreError::BoxNotFound { identifier } => CliError::BoxNotFound { identifier },

            CoreError::Api { message, status: _ } => CliError::ApiError { message },

            CoreError::Configuration { message } => CliError::Config { message },

            CoreError::Evaluation {
                kind,
                target,
                message,
            } => CliError::Validation {
                field: format!("{kind} on {target}"),
                reason: message,
            },

            CoreError::Delivery { transport, message }
            | CoreError::DeliveryExhausted {
                transport,
                message,
                ..
            } => CliError::Delivery { transport, message },

            CoreError::CacheIo { path, message } => CliError::Cache { path, message },

            CoreError::BoxesFailed { failed, details } => CliError::RunFailed { failed, details },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn exit_codes_by_category() {
        let connection: CliError = CoreError::ConnectionFailed {
            url: "https://api.opensensemap.org".into(),
            reason: "refused".into(),
        }
        .into();
        assert_eq!(connection.exit_code(), exit_code::CONNECTION);

        let config: CliError = ConfigError::NotFound {
            path: PathBuf::from("/nope.toml"),
        }
        .into();
        assert_eq!(config.exit_code(), exit_code::CONFIG);

        let run: CliError = CoreError::BoxesFailed {
            failed: 1,
            details: "x".into(),
        }
        .into();
        assert_eq!(run.exit_code(), exit_code::GENERAL);

        let usage = CliError::Validation {
            field: "box id".into(),
            reason: "bad".into(),
        };
        assert_eq!(usage.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn invalid_config_value_is_a_config_error() {
        let err: CliError = ConfigError::Validation {
            field: "notify".into(),
            reason: "invalid notify value 'sometimes'".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::CONFIG);
        assert!(err.to_string().contains("sometimes"));
    }
}
