use tracing::info;

use phpa_core::config::SarimaConfig;
use phpa_core::{SeasonalAction, SeasonalRequest, input};
use phpa_forecast::{ForecastResult, SeasonalService};

use crate::emit::Output;

pub fn sarima(raw: &str, config: &SarimaConfig) -> ForecastResult<Output> {
    let request = input::parse_seasonal_request(raw)?;
    handle(&request, config)
}

pub fn handle(request: &SeasonalRequest, config: &SarimaConfig) -> ForecastResult<Output> {
    let series = request.data.values()?;
    let service = SeasonalService::open(config.clone())?;

    match request.action {
        SeasonalAction::Train => {
            let report = service.train(&series)?;
            info!(order = %report.order, version = report.version, "training stored");
            Ok(Output::Trained)
        }
        SeasonalAction::Predict => {
            let forecast = service.predict(&series, request.look_ahead as usize)?;
            Ok(Output::Forecast(forecast.mean))
        }
    }
}
