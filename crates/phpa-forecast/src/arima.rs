//! Walk-forward forecaster over log-differenced replica counts.
//!
//! # Algorithm
//!
//! ```text
//! logs  = ln(replicas[replicas > 0])
//! diffs = diff(logs)
//! train, test = diffs[..n-x], diffs[n-x..]
//!
//! for each held-out d in test:
//!     fit ARIMA(0,1,0) on train, forecast one step
//!     train.push(d)              // the true value, not the forecast
//!
//! level = logs[n-x]              // cumsum of train seeded with logs[0]
//! for each (forecast, d):
//!     prediction = exp(level + forecast)
//!     level += d
//!
//! answer = floor(last prediction)
//! ```
//!
//! In [`ArimaMode::Ahead`] no held-out truth is used: the model is fitted
//! on every difference and iterated `lookAhead` steps past the end.

use tracing::debug;

use phpa_core::AlgorithmInput;
use phpa_core::config::{ArimaConfig, ArimaMode};
use phpa_core::transform;

use crate::Forecaster;
use crate::error::{ForecastError, ForecastResult};

/// Relative slack applied before flooring so `exp(ln(5)) = 4.999999999999999`
/// still answers 5. A few ulps, far below any genuine fractional part.
const FLOOR_TOLERANCE: f64 = 8.0 * f64::EPSILON;

/// ARIMA(0,1,0) with drift: a random walk whose steps average `drift`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftModel {
    last: f64,
    drift: f64,
}

impl DriftModel {
    /// Fit on `history`. The drift estimate is the mean first difference.
    pub fn fit(history: &[f64]) -> ForecastResult<Self> {
        if history.len() < 2 {
            return Err(ForecastError::ModelFit(format!(
                "ARIMA(0,1,0) needs at least 2 observations, got {}",
                history.len()
            )));
        }
        let steps = transform::difference(history);
        let drift = steps.iter().sum::<f64>() / steps.len() as f64;
        let last = history[history.len() - 1];
        if !drift.is_finite() || !last.is_finite() {
            return Err(ForecastError::ModelFit("non-finite history".to_string()));
        }
        Ok(Self { last, drift })
    }

    pub fn drift(&self) -> f64 {
        self.drift
    }

    /// One-step-ahead forecast.
    pub fn forecast_one(&self) -> f64 {
        self.last + self.drift
    }

    /// Forecasts for horizons `1..=steps`.
    pub fn forecast(&self, steps: usize) -> Vec<f64> {
        (1..=steps).map(|h| self.last + h as f64 * self.drift).collect()
    }
}

/// One step of a walk-forward run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkForwardStep {
    /// One-step-ahead forecast made before `actual` was revealed.
    pub forecast: f64,
    /// The held-out value appended to the history afterwards.
    pub actual: f64,
    /// Number of observations the model was fitted on.
    pub trained_on: usize,
}

/// Refit-per-step one-step-ahead validation over a held-out tail.
///
/// Each call to `next` fits a [`DriftModel`] on the current history,
/// forecasts one step, then appends the true held-out value. A fit failure
/// is yielded once and ends the iteration.
pub struct WalkForward<'a> {
    history: Vec<f64>,
    held_out: std::slice::Iter<'a, f64>,
}

impl<'a> WalkForward<'a> {
    pub fn new(history: Vec<f64>, held_out: &'a [f64]) -> Self {
        Self {
            history,
            held_out: held_out.iter(),
        }
    }

    /// History as it stands, including every held-out value consumed so far.
    pub fn history(&self) -> &[f64] {
        &self.history
    }
}

impl Iterator for WalkForward<'_> {
    type Item = ForecastResult<WalkForwardStep>;

    fn next(&mut self) -> Option<Self::Item> {
        let actual = *self.held_out.next()?;
        let model = match DriftModel::fit(&self.history) {
            Ok(m) => m,
            Err(e) => {
                self.held_out = [].iter();
                return Some(Err(e));
            }
        };
        let step = WalkForwardStep {
            forecast: model.forecast_one(),
            actual,
            trained_on: self.history.len(),
        };
        self.history.push(actual);
        Some(Ok(step))
    }
}

/// Rebuild absolute-scale predictions from walk-forward log-difference forecasts.
///
/// `seed` is the first log value, `train` the training differences, and
/// `steps` the walk-forward output. The level advances by the *actual*
/// difference after each step.
pub fn reconstruct(seed: f64, train: &[f64], steps: &[WalkForwardStep]) -> Vec<f64> {
    let mut level = transform::cumulative_sum(seed, train)
        .last()
        .copied()
        .unwrap_or(seed);
    let mut log_predictions = Vec::with_capacity(steps.len());
    for step in steps {
        log_predictions.push(level + step.forecast);
        level += step.actual;
    }
    transform::exp(&log_predictions)
}

/// Result of a walk-forward validation run on the absolute scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Backtest {
    pub predictions: Vec<f64>,
    pub actuals: Vec<f64>,
}

impl Backtest {
    pub fn rmse(&self) -> f64 {
        if self.predictions.is_empty() {
            return 0.0;
        }
        let sse: f64 = self
            .predictions
            .iter()
            .zip(&self.actuals)
            .map(|(p, a)| (p - a).powi(2))
            .sum();
        (sse / self.predictions.len() as f64).sqrt()
    }
}

/// Walk-forward log-differenced forecaster.
#[derive(Debug, Clone)]
pub struct ArimaForecaster {
    validation_window: usize,
    mode: ArimaMode,
}

impl ArimaForecaster {
    pub fn new(config: &ArimaConfig) -> Self {
        Self {
            validation_window: config.validation_window,
            mode: config.mode,
        }
    }

    pub fn with_mode(mut self, mode: ArimaMode) -> Self {
        self.mode = mode;
        self
    }

    /// Run the walk-forward validation over `replicas`.
    pub fn backtest(&self, replicas: &[f64]) -> ForecastResult<Backtest> {
        let (positive, logs, diffs) = log_differences(replicas)?;
        let x = self.validation_window;
        if diffs.len() <= x {
            return Err(ForecastError::ModelFit(format!(
                "need more than {x} log differences for walk-forward validation, got {}",
                diffs.len()
            )));
        }

        let split = diffs.len() - x;
        let (train, test) = diffs.split_at(split);
        let steps = WalkForward::new(train.to_vec(), test).collect::<ForecastResult<Vec<_>>>()?;
        debug_assert_eq!(steps.len(), x);

        Ok(Backtest {
            predictions: reconstruct(logs[0], train, &steps),
            actuals: positive[split + 1..].to_vec(),
        })
    }

    /// Forecast `look_ahead` steps past the end of `replicas` without
    /// using any held-out values.
    pub fn forecast_ahead(&self, replicas: &[f64], look_ahead: usize) -> ForecastResult<Vec<f64>> {
        let (_, logs, diffs) = log_differences(replicas)?;
        let model = DriftModel::fit(&diffs)?;
        let seed = logs[logs.len() - 1];
        let levels = transform::cumulative_sum(seed, &model.forecast(look_ahead));
        Ok(transform::exp(&levels[1..]))
    }
}

impl Forecaster for ArimaForecaster {
    fn name(&self) -> &'static str {
        "arima"
    }

    fn forecast(&self, input: &AlgorithmInput) -> ForecastResult<i64> {
        let replicas = input.replicas();
        let last = match self.mode {
            ArimaMode::Validation => {
                let backtest = self.backtest(&replicas)?;
                debug!(
                    steps = backtest.predictions.len(),
                    rmse = backtest.rmse(),
                    "walk-forward validation complete"
                );
                backtest.predictions.last().copied()
            }
            ArimaMode::Ahead => self
                .forecast_ahead(&replicas, input.look_ahead as usize)?
                .last()
                .copied(),
        };
        let last = last.ok_or_else(|| ForecastError::ModelFit("no forecast produced".to_string()))?;
        debug!(mode = %self.mode, prediction = last, "arima forecast");
        Ok(floor_replicas(last))
    }
}

/// Floor a reconstructed prediction, absorbing `exp`/`ln` rounding error.
pub fn floor_replicas(value: f64) -> i64 {
    (value * (1.0 + FLOOR_TOLERANCE)).floor() as i64
}

/// Positive replicas, their logs, and the first differences of the logs.
fn log_differences(replicas: &[f64]) -> ForecastResult<(Vec<f64>, Vec<f64>, Vec<f64>)> {
    let positive = transform::positive_only(replicas);
    if positive.is_empty() {
        return Err(ForecastError::ModelFit(
            "no positive replica counts to take the logarithm of".to_string(),
        ));
    }
    let logs = transform::log(&positive);
    let diffs = transform::difference(&logs);
    Ok((positive, logs, diffs))
}
