//! Clap derive structures for the `boxwatch` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-level ────────────────────────────────────────────────────────

/// Watch senseBoxes on openSenseMap and get notified when they misbehave
#[derive(Debug, Parser)]
#[command(
    name = "boxwatch",
    version,
    about = "Health checks and notifications for openSenseMap senseBoxes",
    long_about = "Checks senseBoxes on openSenseMap for stale, out-of-range or faulty \
        measurements and notifies the box owner by email or Slack when a check \
        starts or stops failing.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Path to the config file
    #[arg(long, short = 'c', env = "BOXWATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// openSenseMap API root (overrides config)
    #[arg(long, short = 'a', global = true)]
    pub api: Option<String>,

    /// Send notifications for these results
    #[arg(long, short = 'n', global = true)]
    pub notify: Option<NotifyArg>,

    /// Notify on every run, not only when a result changes
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Path of the result cache file
    #[arg(long, global = true)]
    pub cache_file: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true)]
    pub log_format: Option<LogFormatArg>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Value Enums ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum NotifyArg {
    /// New issues and resolved issues
    All,
    /// New issues only
    #[value(alias = "err")]
    Error,
    /// Resolved issues only
    Ok,
}

impl NotifyArg {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Error => "error",
            Self::Ok => "ok",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    /// Human readable lines
    Plain,
    /// One JSON object per line
    Json,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// One-off check for events on boxes
    Check(CheckArgs),

    /// Check boxes repeatedly at a fixed interval
    Watch(WatchArgs),

    /// Inspect or reset the result cache
    Cache(CacheArgs),

    /// Run debugging checks on boxwatch itself
    Debug(DebugArgs),

    /// Show configuration
    #[command(disable_help_subcommand = true)]
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Check / Watch ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(subcommand)]
    pub target: CheckTarget,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Minutes between checks (overrides config)
    #[arg(long, short = 'i', global = true)]
    pub interval: Option<u64>,

    #[command(subcommand)]
    pub target: CheckTarget,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CheckTarget {
    /// Check one or more boxes by id
    #[command(visible_alias = "box")]
    Boxes {
        /// Box ids (24 hex characters each)
        #[arg(required = true, value_name = "BOX_ID")]
        ids: Vec<String>,
    },

    /// Check every box registered on the openSenseMap instance
    All(BoxFilterArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct BoxFilterArgs {
    /// Only boxes with a measurement at this date (requires --phenomenon)
    #[arg(long, requires = "phenomenon")]
    pub date: Option<String>,

    /// Only boxes with this exposure (indoor, outdoor, mobile)
    #[arg(long)]
    pub exposure: Option<String>,

    /// Only boxes with this group tag
    #[arg(long)]
    pub grouptag: Option<String>,

    /// Only boxes of this hardware model
    #[arg(long)]
    pub model: Option<String>,

    /// Only boxes measuring this phenomenon (requires --date)
    #[arg(long, requires = "date")]
    pub phenomenon: Option<String>,
}

// ── Cache ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// List the cached check states
    Show {
        /// Output format
        #[arg(long, short = 'o', default_value = "table")]
        output: OutputFormat,
    },

    /// Forget every cached check state
    Clear,
}

// ── Debug ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DebugArgs {
    #[command(subcommand)]
    pub command: DebugCommand,
}

#[derive(Debug, Subcommand)]
pub enum DebugCommand {
    /// Send a test notification through every configured transport
    Notifications,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration with secrets masked
    Show,

    /// Print an annotated sample configuration
    Help,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn err_is_an_alias_for_error() {
        let cli = Cli::try_parse_from(["boxwatch", "-n", "err", "config", "show"]);
        assert!(matches!(
            cli.map(|c| c.global.notify),
            Ok(Some(NotifyArg::Error))
        ));
    }

    #[test]
    fn config_help_is_the_sample_subcommand() {
        let cli = Cli::try_parse_from(["boxwatch", "config", "help"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigArgs {
                command: ConfigCommand::Help
            })
        ));
    }

    #[test]
    fn date_requires_phenomenon() {
        let cli = Cli::try_parse_from(["boxwatch", "check", "all", "--date", "2024-01-01"]);
        assert!(cli.is_err());
    }
}
