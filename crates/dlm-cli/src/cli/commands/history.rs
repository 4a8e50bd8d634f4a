//! `dlm history` – list ledger entries.

use anyhow::Result;
use dlm_core::ledger::Ledger;

pub async fn run_history(limit: Option<usize>) -> Result<()> {
    let ledger = Ledger::open_default().await?;
    let entries = ledger.entries(limit).await?;
    if entries.is_empty() {
        println!("No downloads recorded.");
        return Ok(());
    }
    println!("{:<12} {}", "RECORDED", "IDENTITY");
    for e in entries {
        println!("{:<12} {}", e.recorded_at, e.identity);
    }
    Ok(())
}
