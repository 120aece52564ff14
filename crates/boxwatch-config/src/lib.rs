//! Configuration for the boxwatch notifier.
//!
//! A TOML file merged with `BOXWATCH_*` environment variables, plus the
//! per-box health check merging (built-in defaults, then
//! `[healthchecks.default]`, then `[healthchecks.<box id>]`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
    value::Value,
};
use indexmap::IndexMap;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use url::Url;

use boxwatch_core::{
    BoxConfigs, CheckKind, CoreError, NotifyConfig, NotifyEvent, SmtpSettings, StatusFilter,
    TARGET_ALL, notify::email::DEFAULT_SMTP_PORT,
};

/// Annotated sample configuration, shown by `boxwatch config help`.
pub const CONFIG_EXAMPLE: &str = include_str!("../config.example.toml");

/// Prefix of environment variables overriding file settings.
pub const ENV_PREFIX: &str = "BOXWATCH_";

const DEFAULT_API: &str = "https://api.opensensemap.org";
const DEFAULT_INTERVAL_MINUTES: u64 = 30;
const DEFAULT_HEALTHCHECKS: &str = "default";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        CoreError::Configuration {
            message: err.to_string(),
        }
    }
}

// ── Config structs ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

/// Top-level configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// openSenseMap API root.
    #[serde(default = "default_api")]
    pub api: String,

    /// Status filter for notifications; `None` disables notifying.
    #[serde(default)]
    pub notify: Option<String>,

    #[serde(default)]
    pub no_cache: bool,

    /// Watch interval in minutes.
    #[serde(default = "default_interval")]
    pub interval: u64,

    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default)]
    pub cache_file: Option<PathBuf>,

    #[serde(default)]
    pub email: Option<EmailConfig>,

    #[serde(default)]
    pub slack: Option<SlackConfig>,

    /// Raw `[healthchecks.*]` tables, merged per box on demand.
    #[serde(default)]
    pub healthchecks: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub user: Option<String>,
    #[serde(default, deserialize_with = "optional_secret")]
    pub pass: Option<SecretString>,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackConfig {
    #[serde(deserialize_with = "secret")]
    pub webhook: SecretString,
}

fn default_api() -> String {
    DEFAULT_API.into()
}
fn default_interval() -> u64 {
    DEFAULT_INTERVAL_MINUTES
}
fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

fn secret<'de, D: Deserializer<'de>>(d: D) -> Result<SecretString, D::Error> {
    String::deserialize(d).map(SecretString::from)
}

fn optional_secret<'de, D: Deserializer<'de>>(d: D) -> Result<Option<SecretString>, D::Error> {
    Ok(Option::<String>::deserialize(d)?.map(SecretString::from))
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "boxwatch", "boxwatch")
}

fn dirs_fallback(kind: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(kind);
    p.push("boxwatch");
    p
}

/// Default config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default result cache path.
pub fn cache_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".cache").join("cache.yaml"),
        |dirs| dirs.cache_dir().join("cache.yaml"),
    )
}

// ── Loading ─────────────────────────────────────────────────────────

/// Provider stack: config file, then environment.
///
/// An explicitly given `path` must exist; the default path may be absent.
pub fn figment(path: Option<&Path>) -> Result<Figment, ConfigError> {
    let path = match path {
        Some(p) if !p.exists() => {
            return Err(ConfigError::NotFound {
                path: p.to_path_buf(),
            });
        }
        Some(p) => p.to_path_buf(),
        None => config_path(),
    };

    Ok(Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__")))
}

/// Load and validate the configuration.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    Config::from_figment(&figment(path)?)
}

impl Config {
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api_url()?;
        self.status_filter()?;
        if self.interval == 0 {
            return Err(ConfigError::Validation {
                field: "interval".into(),
                reason: "must be at least 1 minute".into(),
            });
        }
        Ok(())
    }

    pub fn api_url(&self) -> Result<Url, ConfigError> {
        self.api.parse().map_err(|e| ConfigError::Validation {
            field: "api".into(),
            reason: format!("invalid URL '{}': {e}", self.api),
        })
    }

    /// `None` when notifications are disabled.
    pub fn status_filter(&self) -> Result<Option<StatusFilter>, ConfigError> {
        self.notify
            .as_deref()
            .map(str::parse::<StatusFilter>)
            .transpose()
            .map_err(|e: CoreError| ConfigError::Validation {
                field: "notify".into(),
                reason: e.to_string(),
            })
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_secs(self.interval.saturating_mul(60))
    }

    pub fn cache_file(&self) -> PathBuf {
        self.cache_file.clone().unwrap_or_else(cache_path)
    }

    /// SMTP settings, when an `[email]` section is present.
    pub fn smtp_settings(&self) -> Option<SmtpSettings> {
        self.email.as_ref().map(|e| SmtpSettings {
            host: e.host.clone(),
            port: e.port,
            user: e.user.clone(),
            password: e.pass.clone(),
            from: e.from.clone(),
        })
    }

    pub fn slack_webhook(&self) -> Option<SecretString> {
        self.slack.as_ref().map(|s| s.webhook.clone())
    }

    // ── Health checks ───────────────────────────────────────────────

    /// Merged rule configuration for one box.
    ///
    /// Built-in default events, overlaid by `[healthchecks.default]`, then by
    /// `[healthchecks.<box id>]`. Tables merge key by key; lists such as
    /// `events` are replaced. A box naming its own `notifications` replaces
    /// the default transport block as a whole.
    pub fn resolve_notify_config(&self, box_id: &str) -> Result<NotifyConfig, ConfigError> {
        let own = self
            .healthchecks
            .get(box_id)
            .or_else(|| self.healthchecks.get(&box_id.to_ascii_lowercase()));
        let mut default = self.healthchecks.get(DEFAULT_HEALTHCHECKS).cloned();

        if let (Some(Value::Dict(_, own)), Some(Value::Dict(_, default))) = (own, default.as_mut()) {
            if own.contains_key("notifications") {
                default.remove("notifications");
            }
        }

        let mut figment = Figment::new().merge(Serialized::defaults(BuiltinHealthchecks::new()));
        if let Some(default) = default {
            figment = figment.merge(Serialized::defaults(default));
        }
        if let Some(own) = own {
            figment = figment.merge(Serialized::defaults(own));
        }

        figment.extract().map_err(|e: figment::Error| ConfigError::Validation {
            field: format!("healthchecks for box {box_id}"),
            reason: e.to_string(),
        })
    }

    /// Resolve every box, keeping per-box failures for the runner.
    pub fn box_configs<'a>(&self, box_ids: impl IntoIterator<Item = &'a str>) -> BoxConfigs {
        box_ids
            .into_iter()
            .map(|id| {
                (
                    id.to_owned(),
                    self.resolve_notify_config(id).map_err(CoreError::from),
                )
            })
            .collect::<IndexMap<_, _>>()
    }

    /// Serializable copy with secrets masked.
    pub fn redacted(&self) -> RedactedConfig<'_> {
        RedactedConfig {
            api: &self.api,
            notify: self.notify.as_deref(),
            no_cache: self.no_cache,
            interval: self.interval,
            log_format: self.log_format,
            cache_file: self.cache_file(),
            email: self.email.as_ref().map(|e| RedactedEmail {
                host: &e.host,
                port: e.port,
                user: e.user.as_deref(),
                pass: e.pass.as_ref().map(|_| REDACTED),
                from: &e.from,
            }),
            slack: self.slack.as_ref().map(|_| RedactedSlack { webhook: REDACTED }),
            healthchecks: &self.healthchecks,
        }
    }
}

/// Events every box gets unless configuration says otherwise.
#[derive(Debug, Serialize)]
struct BuiltinHealthchecks {
    events: Vec<NotifyEvent>,
}

impl BuiltinHealthchecks {
    fn new() -> Self {
        Self {
            events: vec![
                NotifyEvent::new(CheckKind::MeasurementAge, TARGET_ALL, "15m"),
                NotifyEvent::new(CheckKind::MeasurementFaulty, TARGET_ALL, ""),
            ],
        }
    }
}

// ── Redacted view ───────────────────────────────────────────────────

const REDACTED: &str = "********";

#[derive(Debug, Serialize)]
pub struct RedactedConfig<'a> {
    pub api: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify: Option<&'a str>,
    pub no_cache: bool,
    pub interval: u64,
    pub log_format: LogFormat,
    pub cache_file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<RedactedEmail<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack: Option<RedactedSlack>,
    pub healthchecks: &'a BTreeMap<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct RedactedEmail<'a> {
    pub host: &'a str,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass: Option<&'static str>,
    pub from: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RedactedSlack {
    pub webhook: &'static str,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use boxwatch_core::{EmailOptions, TransportConfig};
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const BOX_ID: &str = "593bcd656ccf3b0011791f5a";

    fn from_toml(toml: &str) -> Config {
        Config::from_figment(&Figment::from(Toml::string(toml))).unwrap()
    }

    #[test]
    fn defaults_without_file() {
        let config = from_toml("");
        assert_eq!(config.api, "https://api.opensensemap.org");
        assert_eq!(config.notify, None);
        assert_eq!(config.watch_interval(), Duration::from_secs(30 * 60));
        assert_eq!(config.log_format, LogFormat::Plain);
        assert!(config.smtp_settings().is_none());
        assert!(config.slack_webhook().is_none());
    }

    #[test]
    fn builtin_events_apply_without_healthchecks() {
        let resolved = from_toml("").resolve_notify_config(BOX_ID).unwrap();
        assert_eq!(resolved.notifications, None);
        assert_eq!(
            resolved.events,
            vec![
                NotifyEvent::new(CheckKind::MeasurementAge, TARGET_ALL, "15m"),
                NotifyEvent::new(CheckKind::MeasurementFaulty, TARGET_ALL, ""),
            ]
        );
    }

    #[test]
    fn box_entry_overrides_default() {
        let config = from_toml(
            r#"
            [healthchecks.default]
            notifications = { transport = "email", options = { recipients = ["a@example.org"] } }

            [healthchecks.593bcd656ccf3b0011791f5a]
            events = [{ type = "measurement_max", target = "s1", threshold = "40" }]
            "#,
        );

        let own = config.resolve_notify_config(BOX_ID).unwrap();
        assert_eq!(
            own.notifications,
            Some(TransportConfig::Email(EmailOptions {
                recipients: vec!["a@example.org".into()],
            }))
        );
        assert_eq!(
            own.events,
            vec![NotifyEvent::new(CheckKind::MeasurementMax, "s1", "40")]
        );

        let other = config
            .resolve_notify_config("593bcd656ccf3b0011791fff")
            .unwrap();
        assert_eq!(other.events.len(), 2);
    }

    #[test]
    fn box_transport_replaces_default_transport() {
        let config = from_toml(
            r#"
            [healthchecks.default]
            notifications = { transport = "email", options = { recipients = ["a@example.org"] } }

            [healthchecks.593bcd656ccf3b0011791f5a]
            notifications = { transport = "slack" }
            "#,
        );

        let own = config.resolve_notify_config(BOX_ID).unwrap();
        assert_eq!(own.notifications, Some(TransportConfig::Slack));
    }

    #[test]
    fn unknown_transport_fails_only_that_box() {
        let config = from_toml(
            r#"
            [healthchecks.593bcd656ccf3b0011791f5a]
            notifications = { transport = "xmpp", options = { recipients = ["a@jabber.org"] } }
            "#,
        );

        let configs = config.box_configs([BOX_ID, "593bcd656ccf3b0011791fff"]);
        assert!(matches!(
            configs[BOX_ID],
            Err(CoreError::Configuration { .. })
        ));
        assert!(configs["593bcd656ccf3b0011791fff"].is_ok());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = Config::from_figment(&Figment::from(Toml::string(r#"notify = "warn""#)))
            .unwrap_err();
        assert!(err.to_string().contains("invalid notify"));

        let err =
            Config::from_figment(&Figment::from(Toml::string("interval = 0"))).unwrap_err();
        assert!(err.to_string().contains("interval"));

        let err = Config::from_figment(&Figment::from(Toml::string(r#"api = "not a url""#)))
            .unwrap_err();
        assert!(err.to_string().contains("invalid api"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/boxwatch.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn example_config_is_valid() {
        let config = from_toml(CONFIG_EXAMPLE);
        assert_eq!(config.status_filter().unwrap(), Some(StatusFilter::All));
        assert_eq!(config.smtp_settings().unwrap().port, 587);

        let own = config.resolve_notify_config(BOX_ID).unwrap();
        assert_eq!(own.notifications, Some(TransportConfig::Slack));
        assert_eq!(own.events.len(), 3);
        let default = config
            .resolve_notify_config("593bcd656ccf3b0011791fff")
            .unwrap();
        assert!(matches!(default.notifications, Some(TransportConfig::Email(_))));
    }

    #[test]
    fn environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "boxwatch.toml",
                r#"
                notify = "all"
                [slack]
                webhook = "https://hooks.slack.com/services/file"
                "#,
            )?;
            jail.set_env("BOXWATCH_NOTIFY", "error");
            jail.set_env("BOXWATCH_NO_CACHE", "true");
            jail.set_env("BOXWATCH_EMAIL__HOST", "smtp.example.org");
            jail.set_env("BOXWATCH_EMAIL__FROM", "boxwatch@example.org");
            jail.set_env("BOXWATCH_EMAIL__PASS", "hunter2");

            let config =
                load_config(Some(Path::new("boxwatch.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.status_filter().unwrap(), Some(StatusFilter::Error));
            assert!(config.no_cache);
            let smtp = config.smtp_settings().unwrap();
            assert_eq!(smtp.host, "smtp.example.org");
            assert_eq!(smtp.password.unwrap().expose_secret(), "hunter2");
            assert_eq!(
                config.slack_webhook().unwrap().expose_secret(),
                "https://hooks.slack.com/services/file"
            );
            Ok(())
        });
    }

    #[test]
    fn redacted_view_hides_secrets() {
        let config = from_toml(CONFIG_EXAMPLE);
        let shown = toml::to_string_pretty(&config.redacted()).unwrap();

        assert!(!shown.contains("change me"));
        assert!(!shown.contains("hooks.slack.com"));
        assert!(shown.contains("pass = \"********\""));
        assert!(shown.contains("host = \"smtp.example.org\""));
    }
}
