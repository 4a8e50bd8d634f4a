//! Catalog to candidate queue.
//!
//! Batches are filtered, then their items, then items already handled (ledger or
//! a complete local file) are dropped. Input order is preserved throughout.

mod policy;
mod reconcile;

pub use policy::{keyword_set, Rejection, SelectionPolicy};
pub use reconcile::{inspect, LocalState};

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::LogLevel;
use crate::context::RunContext;
use crate::model::{Batch, Identity, Item};
use crate::probe::LocalProbe;
use crate::url_model::target_path;

/// An admitted item and the path it will be written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub item: Item,
    pub target_path: PathBuf,
}

/// Outcome of one selection pass.
#[derive(Debug, Default)]
pub struct Selection {
    /// Transfer queue, in batch-then-item catalog order.
    pub candidates: Vec<Candidate>,
    /// Batches or items rejected by policy, by name.
    pub rejected: Vec<(String, Rejection)>,
    /// Dropped because the ledger already holds them.
    pub already_recorded: Vec<Identity>,
    /// Dropped because a complete local file was found (now recorded).
    pub already_local: Vec<Identity>,
    /// Second occurrence of an identity or target path.
    pub duplicates: Vec<Identity>,
    /// Reconciliation failed (probe or delete error); these items are `Failed`.
    pub failed: Vec<(Identity, String)>,
}

impl Selection {
    pub fn total_expected(&self) -> u64 {
        self.candidates.iter().map(|c| c.item.expected_length).sum()
    }
}

/// Turn raw batches into an ordered candidate queue.
///
/// Stale partial files are deleted so the item downloads fresh. Complete local
/// files are added to the ledger and skipped. Filesystem errors fail only the
/// item concerned. Reconciliation outcomes go to the run's rolling log.
pub async fn select(
    batches: Vec<Batch>,
    policy: &SelectionPolicy,
    ctx: &RunContext,
    probe: &dyn LocalProbe,
    download_dir: &Path,
) -> Selection {
    let mut out = Selection::default();
    let mut seen_ids: HashSet<Identity> = HashSet::new();
    let mut seen_paths: HashSet<PathBuf> = HashSet::new();

    for batch in batches {
        if let Err(why) = policy.admit_batch(&batch.display_name, batch.total_size) {
            tracing::debug!("skip batch {}: {}", batch.display_name, why);
            out.rejected.push((batch.display_name, why));
            continue;
        }

        for item in batch.items {
            if let Err(why) = policy.admit_item(&item.display_name, item.expected_length) {
                tracing::debug!("skip item {}: {}", item.display_name, why);
                out.rejected.push((item.display_name, why));
                continue;
            }
            if ctx.ledger.contains(&item.identity) {
                out.already_recorded.push(item.identity);
                continue;
            }

            let path = target_path(download_dir, &item);
            // Checked before touching the disk so a duplicate never deletes a queued item's file.
            if seen_ids.contains(&item.identity) || seen_paths.contains(&path) {
                tracing::debug!("duplicate item {} ({})", item.display_name, path.display());
                out.duplicates.push(item.identity);
                continue;
            }

            match inspect(probe, &path, item.expected_length) {
                Ok(LocalState::Absent) => {}
                Ok(LocalState::StalePartial { found, expected }) => {
                    tracing::debug!("{}: {} of {} bytes on disk", path.display(), found, expected);
                    ctx.log_line(
                        LogLevel::Warn,
                        format!("Unfinished file download will restart: {}", item.display_name),
                    );
                    if let Err(e) = probe.delete(&path) {
                        ctx.log_line(
                            LogLevel::Error,
                            format!("Cannot remove {}: {}", path.display(), e),
                        );
                        out.failed.push((item.identity, format!("remove stale partial: {}", e)));
                        continue;
                    }
                }
                Ok(LocalState::Complete { found, expected }) => {
                    if found > expected {
                        ctx.log_line(
                            LogLevel::Warn,
                            format!(
                                "{} is larger than expected ({} > {} bytes), keeping it",
                                item.display_name, found, expected
                            ),
                        );
                    }
                    ctx.log_line(
                        LogLevel::Info,
                        format!("Already downloaded: {}", item.display_name),
                    );
                    if let Err(e) = ctx.ledger.add(&item.identity).await {
                        ctx.log_line(
                            LogLevel::Warn,
                            format!("Cannot record {}: {:#}", item.display_name, e),
                        );
                    }
                    out.already_local.push(item.identity);
                    continue;
                }
                Err(e) => {
                    ctx.log_line(
                        LogLevel::Error,
                        format!("Cannot inspect {}: {}", path.display(), e),
                    );
                    out.failed.push((item.identity, format!("inspect local file: {}", e)));
                    continue;
                }
            }

            seen_ids.insert(item.identity.clone());
            seen_paths.insert(path.clone());
            out.candidates.push(Candidate {
                item,
                target_path: path,
            });
        }
    }
    out
}
