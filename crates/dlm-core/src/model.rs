//! Catalog value types: batches (torrents) and the items (files) inside them.
//!
//! Items are plain values. Runtime state (status, received bytes, start time)
//! lives in side tables keyed by [`Identity`] owned by the scheduler and the
//! progress aggregator, never on the item itself.

/// Unique key of an item: its source URI. Used for ledger dedup and path safety.
pub type Identity = String;

/// One downloadable file inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub identity: Identity,
    pub display_name: String,
    pub expected_length: u64,
}

impl Item {
    pub fn new(
        display_name: impl Into<String>,
        source_uri: impl Into<String>,
        expected_length: u64,
    ) -> Self {
        Self {
            identity: source_uri.into(),
            display_name: display_name.into(),
            expected_length,
        }
    }

    /// URI the bytes are fetched from (same string as the identity).
    pub fn source_uri(&self) -> &str {
        &self.identity
    }
}

/// A remote grouping of items, filtered as a unit before its items are considered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub id: String,
    pub display_name: String,
    pub total_size: u64,
    pub items: Vec<Item>,
}

/// Lifecycle of an item within one run. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemStatus {
    Discovered,
    Queued,
    Transferring,
    Completed,
    Failed,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Discovered => "discovered",
            ItemStatus::Queued => "queued",
            ItemStatus::Transferring => "transferring",
            ItemStatus::Completed => "completed",
            ItemStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ItemStatus::Completed | ItemStatus::Failed)
    }

    /// Whether `next` is a legal successor. `Completed` is reachable only from
    /// `Transferring`; `Failed` from any non-terminal state.
    pub fn can_advance_to(self, next: ItemStatus) -> bool {
        if self.is_terminal() || next <= self {
            return false;
        }
        match next {
            ItemStatus::Completed => self == ItemStatus::Transferring,
            _ => true,
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
