//! Config subcommand handlers.

use boxwatch_config::{CONFIG_EXAMPLE, Config};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// `config show`: the effective configuration as TOML, secrets masked.
pub fn show(cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let rendered = output::render_toml(&cfg.redacted())?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

/// `config help`: an annotated sample configuration.
pub fn help(global: &GlobalOpts) {
    output::print_output(CONFIG_EXAMPLE, global.quiet);
}
