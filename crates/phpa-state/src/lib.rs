//! phpa-state — persisted model store for the stateful forecasters.
//!
//! Backed by [redb](https://docs.rs/redb). Models are JSON-serialized into
//! a single table keyed by model name and wrapped in a [`StoredModel`]
//! record carrying a monotonic version tag.
//!
//! # Access discipline
//!
//! A load-modify-persist cycle runs inside one redb write transaction
//! ([`StateStore::update`]). Write transactions are exclusive within a
//! process, the database file is locked against other processes, and
//! commits are atomic, so readers never observe a half-written model.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::StoredModel;
