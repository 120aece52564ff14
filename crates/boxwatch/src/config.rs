//! Effective configuration: config file and environment, then CLI flags.

use boxwatch_config::{Config, LogFormat, load_config};

use crate::cli::{GlobalOpts, LogFormatArg};
use crate::error::CliError;

/// Load the config file named by `--config` (or the default one) and
/// apply the global flags on top.
pub fn resolve(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = load_config(global.config.as_deref())?;
    apply_overrides(&mut cfg, global);
    cfg.validate()?;
    Ok(cfg)
}

fn apply_overrides(cfg: &mut Config, global: &GlobalOpts) {
    if let Some(ref api) = global.api {
        cfg.api.clone_from(api);
    }
    if let Some(notify) = global.notify {
        cfg.notify = Some(notify.as_str().to_owned());
    }
    if global.no_cache {
        cfg.no_cache = true;
    }
    if let Some(ref path) = global.cache_file {
        cfg.cache_file = Some(path.clone());
    }
    if let Some(format) = global.log_format {
        cfg.log_format = match format {
            LogFormatArg::Plain => LogFormat::Plain,
            LogFormatArg::Json => LogFormat::Json,
        };
    }
}
