//! phpa-core — shared contract for the PHPA forecasters.
//!
//! Holds the wire types every forecaster reads (`AlgorithmInput`, the
//! versioned `Envelope`, seasonal `SeriesData`), the stationarity
//! transforms used to move between replica counts and model space, the
//! `phpa.toml` configuration, and the input error taxonomy.

pub mod config;
pub mod error;
pub mod input;
pub mod retention;
pub mod transform;
pub mod types;

pub use config::PhpaConfig;
pub use error::{InputError, InputResult};
pub use types::*;
