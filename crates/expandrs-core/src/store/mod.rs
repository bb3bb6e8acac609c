// Expandrs Store Boundary
// Async storage contract the expansion path reads through

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::abbreviation::{Abbreviation, AbbreviationError, ChoiceConfig};

/// Errors at the storage boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unknown abbreviation: {0}")]
    UnknownAbbreviation(String),

    #[error("duplicate abbreviation key: {0}")]
    DuplicateKey(String),

    #[error("duplicate choice config id: {0}")]
    DuplicateChoiceId(u32),

    #[error("invalid abbreviation '{key}': {source}")]
    InvalidAbbreviation {
        key: String,
        #[source]
        source: AbbreviationError,
    },

    #[error("choice config {0} has no options")]
    EmptyChoiceConfig(u32),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Change notifications pushed by the store; the expansion path refreshes
/// its snapshot on these instead of polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// Abbreviations or rules changed.
    AbbreviationsChanged,
    /// Initial data was seeded.
    DataSeeded,
}

/// Read contract of the abbreviation store.
///
/// The core only reads; every write funnels through the store's own
/// validation. The one exception is the fire-and-forget usage increment
/// dispatched after a successful expansion.
#[async_trait]
pub trait AbbreviationStore: Send + Sync {
    /// All abbreviations with their rules embedded, in declaration order.
    async fn all_abbreviations(&self) -> Result<Vec<Abbreviation>, StoreError>;

    /// Record one use of an abbreviation.
    async fn increment_usage(&self, key: &str) -> Result<(), StoreError>;

    /// Fetch the choice configuration referenced by a choice directive.
    async fn choice_config(&self, id: u32) -> Result<Option<ChoiceConfig>, StoreError>;
}
