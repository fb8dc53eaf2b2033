//! redb table definitions for the model store.

use redb::TableDefinition;

/// Serialized `StoredModel` records keyed by model name.
pub const MODELS: TableDefinition<&str, &[u8]> = TableDefinition::new("models");
