//! Durable ledger of completed identities (SQLite via sqlx).
//!
//! Append-only: identities are added when a transfer completes or when
//! reconciliation finds a complete local file, and never removed. The whole
//! set is cached in memory at open so `contains` is a plain lookup.

mod db;

pub use db::{Ledger, LedgerEntry};

#[cfg(test)]
pub(crate) use db::open_memory;

#[cfg(test)]
mod tests;
