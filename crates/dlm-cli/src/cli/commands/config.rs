//! `dlm config` – show where the config lives and what is in effect.

use anyhow::Result;
use dlm_core::config::{self, DlmConfig};
use dlm_core::{ledger::Ledger, logging};
use std::path::Path;

pub fn run_config(cfg: &DlmConfig, path: &Path) -> Result<()> {
    println!("config file:   {}", path.display());
    println!("download dir:  {}", cfg.resolved_download_dir().display());
    match Ledger::default_path() {
        Ok(p) => println!("ledger:        {}", p.display()),
        Err(e) => println!("ledger:        unavailable ({:#})", e),
    }
    match logging::log_file_path() {
        Ok(p) => println!("log file:      {}", p.display()),
        Err(e) => println!("log file:      unavailable ({:#})", e),
    }
    println!("log level:     {}", cfg.log_level().as_str());
    println!("slots:         {}", cfg.max_concurrent());
    println!(
        "api key:       {}",
        if cfg.api_key().is_some() { "set" } else { "not set" }
    );
    println!();
    print!("{}", config::to_display_toml(cfg)?);
    Ok(())
}
