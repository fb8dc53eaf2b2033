use tracing::info;

use phpa_core::config::{ArimaConfig, KnnConfig};
use phpa_core::{AlgorithmInput, input};
use phpa_forecast::{ArimaForecaster, ForecastResult, Forecaster, MovingAverageForecaster};

use crate::emit::Output;

pub fn arima(raw: &str, config: &ArimaConfig) -> ForecastResult<Output> {
    let input = input::parse_algorithm_input(raw)?;
    predict(&ArimaForecaster::new(config), &input)
}

pub fn knn(raw: &str, config: &KnnConfig) -> ForecastResult<Output> {
    let input = input::parse_algorithm_input(raw)?;
    predict(&MovingAverageForecaster::new(config), &input)
}

/// Run any stateless forecaster on an already validated input.
pub fn predict(forecaster: &dyn Forecaster, input: &AlgorithmInput) -> ForecastResult<Output> {
    let replicas = forecaster.forecast(input)?;
    info!(
        forecaster = forecaster.name(),
        evaluations = input.evaluations.len(),
        replicas,
        "forecast complete"
    );
    Ok(Output::Replicas(replicas))
}
