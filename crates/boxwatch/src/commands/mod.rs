//! Command dispatch: bridges CLI args to the core crates.

pub mod cache;
pub mod check;
pub mod config_cmd;
pub mod debug;
pub mod util;
pub mod watch;

use boxwatch_config::Config;

use crate::cli::{Command, ConfigCommand, GlobalOpts};
use crate::error::CliError;

/// Dispatch a command that needs the effective configuration.
pub async fn dispatch(cmd: Command, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Check(args) => check::handle(args, cfg).await,
        Command::Watch(args) => watch::handle(args, cfg).await,
        Command::Cache(args) => cache::handle(args, cfg, global),
        Command::Debug(args) => debug::handle(args, cfg).await,
        Command::Config(args) => match args.command {
            ConfigCommand::Show => config_cmd::show(cfg, global),
            ConfigCommand::Help => {
                config_cmd::help(global);
                Ok(())
            }
        },
        // Completions are handled before the configuration is loaded
        Command::Completions(_) => unreachable!(),
    }
}
