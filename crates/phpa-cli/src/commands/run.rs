//! Versioned envelope dispatch.

use tracing::debug;

use phpa_core::{ForecastRequest, PhpaConfig, input};
use phpa_forecast::{ArimaForecaster, ForecastResult, MovingAverageForecaster};

use super::{forecast, seasonal};
use crate::emit::Output;

pub fn run(raw: &str, config: &PhpaConfig) -> ForecastResult<Output> {
    let envelope = input::parse_envelope(raw)?;
    debug!(algorithm = envelope.request.algorithm(), "dispatching envelope");

    match &envelope.request {
        ForecastRequest::Arima(input) => {
            forecast::predict(&ArimaForecaster::new(&config.arima), input)
        }
        ForecastRequest::Knn(input) => {
            forecast::predict(&MovingAverageForecaster::new(&config.knn), input)
        }
        ForecastRequest::Sarima(request) => seasonal::handle(request, &config.sarima),
    }
}
