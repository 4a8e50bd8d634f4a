//! CLI command handlers, one file per command.

mod config;
mod history;
mod run;

pub use config::run_config;
pub use history::run_history;
pub use run::{run_once, RunOverrides};
