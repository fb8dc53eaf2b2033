//! Seasonal forecasting service over a persisted model.
//!
//! `train` runs the full order search and overwrites the stored model.
//! `predict` loads the model, folds in the new observations, forecasts,
//! and writes the refreshed model back, all inside one exclusive store
//! transaction so concurrent predicts cannot lose each other's updates.

use tracing::{debug, info};

use phpa_core::AlgorithmInput;
use phpa_core::config::SarimaConfig;
use phpa_state::{StateStore, StoredModel};

use super::model::{SarimaModel, SarimaOrder, SeasonalForecast};
use super::search::{self, SearchSpace};
use crate::Forecaster;
use crate::error::{ForecastError, ForecastResult};

/// Store key of the seasonal model.
pub const MODEL_KEY: &str = "sarima";

/// Outcome of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub order: SarimaOrder,
    pub aic: f64,
    pub version: u64,
}

pub struct SeasonalService {
    store: StateStore,
    config: SarimaConfig,
}

impl SeasonalService {
    pub fn new(store: StateStore, config: SarimaConfig) -> Self {
        Self { store, config }
    }

    /// Open the on-disk store named by `config.store_path`.
    pub fn open(config: SarimaConfig) -> ForecastResult<Self> {
        let store = StateStore::open(&config.store_path)?;
        Ok(Self::new(store, config))
    }

    fn search_space(&self) -> SearchSpace {
        SearchSpace {
            max_p: self.config.max_p,
            max_q: self.config.max_q,
            period: self.config.seasonal_period,
            budget: self.config.search_budget,
        }
    }

    /// Search for the best order on `series` and persist the fitted model,
    /// replacing any stored one.
    pub fn train(&self, series: &[f64]) -> ForecastResult<TrainReport> {
        let model = search::stepwise(series, self.search_space())?;
        let version = self.store.save(MODEL_KEY, &model)?;
        info!(order = %model.order, aic = model.aic, version, "seasonal model trained");
        Ok(TrainReport {
            order: model.order,
            aic: model.aic,
            version,
        })
    }

    /// Update the stored model with `series` and forecast `n_periods` ahead.
    pub fn predict(&self, series: &[f64], n_periods: usize) -> ForecastResult<SeasonalForecast> {
        let iterations = self.config.update_iterations;
        let history_limit = self.config.history_limit;

        let (forecast, version) =
            self.store
                .update(MODEL_KEY, |model: &mut SarimaModel| -> ForecastResult<_> {
                    model.update(series, iterations, history_limit)?;
                    Ok(model.forecast(n_periods))
                })?;

        debug!(
            version,
            lower = ?forecast.lower,
            upper = ?forecast.upper,
            "seasonal forecast intervals"
        );
        Ok(forecast)
    }

    /// The stored model, if any.
    pub fn model(&self) -> ForecastResult<StoredModel<SarimaModel>> {
        Ok(self.store.load(MODEL_KEY)?)
    }
}

impl Forecaster for SeasonalService {
    fn name(&self) -> &'static str {
        "sarima"
    }

    fn forecast(&self, input: &AlgorithmInput) -> ForecastResult<i64> {
        let forecast = self.predict(&input.replicas(), input.look_ahead as usize)?;
        let last = forecast
            .mean
            .last()
            .copied()
            .ok_or_else(|| ForecastError::ModelFit("empty seasonal forecast".to_string()))?;
        Ok(last.floor() as i64)
    }
}
