//! Moving-average forecaster over replica deltas.
//!
//! Predicts each replica count as the previous count plus the mean of the
//! `k` deltas before it. The first `k` positions have no complete window
//! and are reported as `0`.

use tracing::debug;

use phpa_core::AlgorithmInput;
use phpa_core::config::KnnConfig;

use crate::Forecaster;
use crate::error::{ForecastError, ForecastResult};

#[derive(Debug, Clone)]
pub struct MovingAverageForecaster {
    k: usize,
}

impl MovingAverageForecaster {
    pub fn new(config: &KnnConfig) -> Self {
        Self { k: config.k.max(1) }
    }

    pub fn with_k(k: usize) -> Self {
        Self { k: k.max(1) }
    }

    /// Predicted deltas; the first `k` are zeroed warm-up values.
    pub fn predicted_deltas(&self, replicas: &[f64]) -> Vec<f64> {
        let deltas = deltas(replicas);
        (0..deltas.len())
            .map(|i| {
                if i < self.k {
                    0.0
                } else {
                    let window = &deltas[i - self.k..i];
                    let mean = window.iter().sum::<f64>() / self.k as f64;
                    (mean * 100.0).floor() / 100.0
                }
            })
            .collect()
    }

    /// Absolute predictions for every position; positions `< k` are `0`.
    pub fn predictions(&self, replicas: &[f64]) -> Vec<f64> {
        self.predicted_deltas(replicas)
            .into_iter()
            .enumerate()
            .map(|(i, delta)| if i < self.k { 0.0 } else { replicas[i - 1] + delta })
            .collect()
    }
}

impl Forecaster for MovingAverageForecaster {
    fn name(&self) -> &'static str {
        "knn"
    }

    fn forecast(&self, input: &AlgorithmInput) -> ForecastResult<i64> {
        let replicas = input.replicas();
        if replicas.len() <= self.k {
            return Err(ForecastError::ModelFit(format!(
                "need more than k = {} evaluations, got {}",
                self.k,
                replicas.len()
            )));
        }
        let predictions = self.predictions(&replicas);
        let last = predictions[predictions.len() - 1];
        debug!(k = self.k, prediction = last, "moving-average forecast");
        Ok(last.floor() as i64)
    }
}

/// `delta[0] = 0`, `delta[i] = replicas[i] - replicas[i - 1]`.
fn deltas(replicas: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(replicas.len());
    if !replicas.is_empty() {
        out.push(0.0);
    }
    out.extend(replicas.windows(2).map(|w| w[1] - w[0]));
    out
}
