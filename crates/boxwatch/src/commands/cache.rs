//! Cache subcommand handlers.

use tabled::Tabled;

use boxwatch_config::Config;
use boxwatch_core::{CacheEntry, ResultCache};

use crate::cli::{CacheArgs, CacheCommand, GlobalOpts};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct CacheRow {
    #[tabled(rename = "Box")]
    box_id: String,
    #[tabled(rename = "Event")]
    event_id: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&CacheEntry> for CacheRow {
    fn from(e: &CacheEntry) -> Self {
        Self {
            box_id: e.box_id.clone(),
            // first 12 hex chars are enough to tell rules apart on screen
            event_id: e.event_id.chars().take(12).collect(),
            status: e.status.to_string(),
        }
    }
}

pub fn handle(args: CacheArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let path = cfg.cache_file();
    let mut cache = ResultCache::load(&path);

    match args.command {
        CacheCommand::Show { output: format } => {
            let entries = cache.entries();
            if entries.is_empty() {
                if !global.quiet {
                    eprintln!("Cache at {} is empty.", path.display());
                }
                return Ok(());
            }
            let out = output::render_list(format, &entries, |e| CacheRow::from(e))?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CacheCommand::Clear => {
            let prompt = format!("Forget {} cached check state(s)?", cache.len());
            if !util::confirm(&prompt, "cache clear", global.yes)? {
                return Ok(());
            }
            cache.clear()?;
            if !global.quiet {
                eprintln!("Cleared {}", path.display());
            }
            Ok(())
        }
    }
}
