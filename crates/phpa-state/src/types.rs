//! Record types persisted by the model store.

use serde::{Deserialize, Serialize};

/// A model together with its bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredModel<T> {
    /// Incremented on every successful write; starts at 1.
    pub version: u64,
    /// Unix timestamp (seconds) of the last write.
    pub updated_at: u64,
    pub model: T,
}
