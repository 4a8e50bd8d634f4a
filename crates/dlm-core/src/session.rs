//! One complete run: catalog, selection, transfers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::catalog::{CatalogFetch, CatalogProvider};
use crate::config::{DlmConfig, LogLevel};
use crate::context::RunContext;
use crate::probe::LocalProbe;
use crate::scheduler::{RunReport, TransferScheduler};
use crate::selection::{select, SelectionPolicy};
use crate::transfer::Transport;

/// Per-run settings, fixed at run start.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub max_concurrent: usize,
    pub download_dir: PathBuf,
    pub policy: SelectionPolicy,
}

impl SessionOptions {
    pub fn from_config(cfg: &DlmConfig) -> Self {
        Self {
            max_concurrent: cfg.max_concurrent(),
            download_dir: cfg.resolved_download_dir(),
            policy: SelectionPolicy::from_filters(&cfg.filters),
        }
    }
}

/// Fetch the catalog, select candidates, and transfer them.
///
/// Catalog errors are logged and the run goes on with whatever was returned.
/// Items that failed during selection are reported as failed alongside the
/// transfer failures.
pub async fn run_session(
    catalog: Arc<dyn CatalogProvider>,
    options: &SessionOptions,
    probe: &dyn LocalProbe,
    transport: Arc<dyn Transport>,
    ctx: &RunContext,
) -> Result<RunReport> {
    let CatalogFetch { batches, error } =
        tokio::task::spawn_blocking(move || catalog.fetch_batches())
            .await
            .context("catalog task failed")?;
    if let Some(e) = error {
        ctx.log_line(LogLevel::Error, e.to_string());
    }

    let batch_count = batches.len();
    let selection = select(
        batches,
        &options.policy,
        ctx,
        probe,
        &options.download_dir,
    )
    .await;
    ctx.log_line(
        LogLevel::Info,
        format!(
            "{} available files found in {} batches",
            selection.candidates.len(),
            batch_count
        ),
    );

    let mut report = TransferScheduler::new(options.max_concurrent, transport)
        .run(selection.candidates, ctx)
        .await
        .context("transfer scheduler")?;
    report.failed.extend(selection.failed);

    ctx.log_line(LogLevel::Info, "All downloads processed");
    Ok(report)
}
