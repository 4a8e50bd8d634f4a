//! `dlm run` – one selection-and-transfer run with a live console view.

use anyhow::Result;
use dlm_core::catalog::{CatalogProvider, FurkCatalog, JsonCatalog};
use dlm_core::config::{self, DlmConfig};
use dlm_core::context::RunContext;
use dlm_core::control::Liveness;
use dlm_core::ledger::Ledger;
use dlm_core::probe::FsProbe;
use dlm_core::progress::ProgressAggregator;
use dlm_core::session::{run_session, SessionOptions};
use dlm_core::transfer::{CurlTransport, SimulatedTransport, Transport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::cli::console::{self, ConsoleSink};

/// Transfers abort when the console has not refreshed for this long.
const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(10);
const RENDER_INTERVAL: Duration = Duration::from_secs(1);

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct RunOverrides {
    pub catalog_file: Option<PathBuf>,
    pub download_dir: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub simulate: bool,
}

pub async fn run_once(cfg: &DlmConfig, overrides: RunOverrides) -> Result<()> {
    let options = session_options(cfg, &overrides);
    config::prepare_download_dir(&options.download_dir)?;

    let catalog = build_catalog(cfg, overrides.catalog_file.as_deref())?;
    let transport: Arc<dyn Transport> = if overrides.simulate || cfg.simulate {
        Arc::new(SimulatedTransport::default())
    } else {
        Arc::new(CurlTransport::default())
    };
    let ledger = Ledger::open_default().await?;
    tracing::debug!("ledger holds {} identities", ledger.len());

    let progress = Arc::new(ProgressAggregator::new());
    let liveness = Liveness::with_heartbeat(HEARTBEAT_TIMEOUT);
    let ctx = RunContext::new(
        ledger,
        Arc::clone(&progress),
        Arc::new(ConsoleSink),
        liveness.clone(),
    );

    let (stop_tx, stop_rx) = oneshot::channel();
    let renderer = tokio::spawn(console::render_loop(
        Arc::clone(&progress),
        liveness.clone(),
        RENDER_INTERVAL,
        stop_rx,
    ));
    let interrupt = {
        let liveness = liveness.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, stopping downloads");
                liveness.request_shutdown();
            }
        })
    };

    let result = run_session(catalog, &options, &FsProbe, transport, &ctx).await;
    interrupt.abort();
    let _ = stop_tx.send(());
    let _ = renderer.await;

    let report = result?;
    println!("{}", console::summary_line(&report));
    for (identity, reason) in &report.failed {
        println!("  failed: {} ({})", identity, reason);
    }
    Ok(())
}

fn session_options(cfg: &DlmConfig, overrides: &RunOverrides) -> SessionOptions {
    let mut options = SessionOptions::from_config(cfg);
    if let Some(dir) = &overrides.download_dir {
        options.download_dir = dir.clone();
    }
    if let Some(jobs) = overrides.jobs {
        options.max_concurrent = jobs.max(1);
    }
    options
}

fn build_catalog(cfg: &DlmConfig, catalog_file: Option<&Path>) -> Result<Arc<dyn CatalogProvider>> {
    if let Some(path) = catalog_file {
        return Ok(Arc::new(JsonCatalog::new(path)));
    }
    let Some(key) = cfg.api_key() else {
        anyhow::bail!(
            "no seedbox API key configured; set catalog.api_key in the config file or pass --catalog-file"
        );
    };
    Ok(Arc::new(FurkCatalog::new(&cfg.catalog.endpoint, key)?))
}
