//! phpa-forecast — replica-count forecasters.
//!
//! Three interchangeable strategies answer the same question: given the
//! evaluation history, how many replicas will be needed?
//!
//! | Forecaster | Method | State |
//! |---|---|---|
//! | [`ArimaForecaster`] | ARIMA(0,1,0) on `diff(ln(replicas))`, walk-forward validated | none |
//! | [`SeasonalService`] | SARIMA(p,1,q)(P,1,Q)m, stepwise order search | persisted model |
//! | [`MovingAverageForecaster`] | mean of the last `k` replica deltas | none |
//!
//! Fit failures are returned as [`ForecastError::ModelFit`]; a forecaster
//! never answers with a silent zero.

pub mod arima;
pub mod error;
pub mod knn;
pub mod sarima;

use phpa_core::AlgorithmInput;

pub use arima::{ArimaForecaster, DriftModel, WalkForward};
pub use error::{ForecastError, ForecastResult};
pub use knn::MovingAverageForecaster;
pub use sarima::{SarimaModel, SarimaOrder, SeasonalForecast, SeasonalService};

/// A replica-count forecasting strategy.
pub trait Forecaster {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Predict the replica count the controller should scale to.
    fn forecast(&self, input: &AlgorithmInput) -> ForecastResult<i64>;
}
