//! CLI for the DLM seedbox download manager.

mod commands;
mod console;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dlm_core::config::{self, DlmConfig};
use dlm_core::logging;
use std::path::PathBuf;

use commands::{run_config, run_history, run_once, RunOverrides};

/// Top-level CLI for the DLM download manager.
#[derive(Debug, Parser)]
#[command(name = "dlm")]
#[command(about = "DLM: fetch finished seedbox files to local storage", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the XDG config path.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch the catalog, select files and download them.
    Run {
        /// Read batches from a local JSON file instead of the seedbox API.
        #[arg(long, value_name = "PATH")]
        catalog_file: Option<PathBuf>,
        /// Write files here instead of the configured download directory.
        #[arg(long, value_name = "DIR")]
        download_dir: Option<PathBuf>,
        /// Transfer up to N files at once (overrides max_concurrent_downloads).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
        /// Create empty placeholder files instead of downloading.
        #[arg(long)]
        simulate: bool,
    },

    /// List identities recorded as downloaded, newest first.
    History {
        /// Show at most N entries.
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },

    /// Show the config file path and effective settings.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let (cfg, cfg_path) = load_config(cli.config)?;

        // Log to the state file; fall back to stderr so the CLI still runs.
        if let Err(e) = logging::init_logging(cfg.log_level()) {
            logging::init_logging_stderr(cfg.log_level());
            tracing::warn!("file logging unavailable, using stderr: {:#}", e);
        }
        tracing::debug!("loaded config from {}", cfg_path.display());

        match cli.command {
            CliCommand::Run {
                catalog_file,
                download_dir,
                jobs,
                simulate,
            } => {
                let overrides = RunOverrides {
                    catalog_file,
                    download_dir,
                    jobs,
                    simulate,
                };
                run_once(&cfg, overrides).await?;
            }
            CliCommand::History { limit } => run_history(limit).await?,
            CliCommand::Config => run_config(&cfg, &cfg_path)?,
        }

        Ok(())
    }
}

fn load_config(explicit: Option<PathBuf>) -> Result<(DlmConfig, PathBuf)> {
    match explicit {
        Some(path) => Ok((config::load_from_path(&path)?, path)),
        None => Ok((config::load_or_init()?, config::config_path()?)),
    }
}

#[cfg(test)]
mod tests;
