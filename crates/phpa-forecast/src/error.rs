//! Forecaster error types.

use thiserror::Error;

use phpa_core::InputError;
use phpa_state::StateError;

/// Errors that can occur while producing a forecast.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("model fit failed: {0}")]
    ModelFit(String),

    #[error("model persistence failed: {0}")]
    Persistence(#[from] StateError),
}

impl ForecastError {
    /// Process exit status reported for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            ForecastError::Input(_) => 1,
            ForecastError::ModelFit(_) => 2,
            ForecastError::Persistence(_) => 3,
        }
    }
}

pub type ForecastResult<T> = Result<T, ForecastError>;
