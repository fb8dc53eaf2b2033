use phpa_core::config::RetentionConfig;
use phpa_core::{input, retention};
use phpa_forecast::ForecastResult;

use crate::emit::Output;

pub fn retain(raw: &str, config: &RetentionConfig) -> ForecastResult<Output> {
    let input = input::parse_algorithm_input(raw)?;
    Ok(Output::Ids(retention::ids_to_remove(
        &input.evaluations,
        config.stored_values,
    )))
}
