//! Wire types shared by the forecasters.
//!
//! Field names follow the controller's camelCase JSON (`targetReplicas`,
//! `lookAhead`, `currentTime`) and map onto snake_case Rust fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{InputError, InputResult};

/// Current version of the unified request envelope.
pub const ENVELOPE_VERSION: u32 = 1;

/// Look-ahead used by the seasonal forecaster when the request omits one.
pub const DEFAULT_SEASONAL_LOOK_AHEAD: u32 = 3;

// ── Evaluations ────────────────────────────────────────────────────

/// Outcome of a single scaling evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationValue {
    pub target_replicas: u32,
}

/// A timestamped scaling evaluation recorded by the controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub id: i64,
    pub created: DateTime<Utc>,
    pub val: EvaluationValue,
}

/// Payload handed to the walk-forward and moving-average forecasters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmInput {
    /// Number of steps ahead the forecast must cover.
    pub look_ahead: u32,
    /// Evaluation history. Delivery order is not guaranteed.
    pub evaluations: Vec<Evaluation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_time: Option<DateTime<Utc>>,
}

impl AlgorithmInput {
    /// Check the structural invariants the forecasters rely on.
    pub fn validate(&self) -> InputResult<()> {
        if self.look_ahead == 0 {
            return Err(InputError::Invalid("lookAhead must be at least 1".to_string()));
        }
        if self.evaluations.is_empty() {
            return Err(InputError::Invalid("evaluations must not be empty".to_string()));
        }
        Ok(())
    }

    /// Replica series ordered by creation time, ties broken by id.
    pub fn replicas(&self) -> Vec<f64> {
        sorted_replicas(&self.evaluations)
    }
}

/// Sort evaluations chronologically and project their target replicas.
pub fn sorted_replicas(evaluations: &[Evaluation]) -> Vec<f64> {
    let mut ordered: Vec<&Evaluation> = evaluations.iter().collect();
    ordered.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
    ordered
        .into_iter()
        .map(|e| f64::from(e.val.target_replicas))
        .collect()
}

// ── Seasonal payloads ──────────────────────────────────────────────

/// Time series handed to the seasonal forecaster.
///
/// Accepts the column layout used by the seasonal service
/// (`{"Date": [...], "Replicas": [...]}`) as well as a plain
/// evaluation list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SeriesData {
    Columns {
        #[serde(rename = "Date")]
        date: Vec<serde_json::Value>,
        #[serde(rename = "Replicas")]
        replicas: Vec<f64>,
    },
    Evaluations { evaluations: Vec<Evaluation> },
}

impl SeriesData {
    /// Build a column payload with positional date labels.
    pub fn from_values(values: &[f64]) -> Self {
        SeriesData::Columns {
            date: (0..values.len()).map(|i| serde_json::Value::from(i as u64)).collect(),
            replicas: values.to_vec(),
        }
    }

    /// Ordered observation values, validated.
    pub fn values(&self) -> InputResult<Vec<f64>> {
        let values = match self {
            SeriesData::Columns { date, replicas } => {
                if date.len() != replicas.len() {
                    return Err(InputError::Invalid(format!(
                        "Date has {} labels but Replicas has {} values",
                        date.len(),
                        replicas.len()
                    )));
                }
                replicas.clone()
            }
            SeriesData::Evaluations { evaluations } => sorted_replicas(evaluations),
        };

        if values.is_empty() {
            return Err(InputError::Invalid("series must not be empty".to_string()));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(InputError::Invalid(format!("series contains non-finite value {bad}")));
        }
        Ok(values)
    }
}

/// Operation requested from the seasonal forecaster.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalAction {
    /// Full order search; overwrites the stored model.
    Train,
    /// Incremental update of the stored model, then forecast.
    Predict,
}

/// Request body for the seasonal forecaster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalRequest {
    pub action: SeasonalAction,
    #[serde(default = "default_seasonal_look_ahead")]
    pub look_ahead: u32,
    pub data: SeriesData,
}

impl SeasonalRequest {
    pub fn validate(&self) -> InputResult<()> {
        if self.look_ahead == 0 {
            return Err(InputError::Invalid("lookAhead must be at least 1".to_string()));
        }
        self.data.values().map(|_| ())
    }
}

fn default_seasonal_look_ahead() -> u32 {
    DEFAULT_SEASONAL_LOOK_AHEAD
}

// ── Envelope ───────────────────────────────────────────────────────

/// Versioned request envelope that carries any forecaster payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub version: u32,
    #[serde(flatten)]
    pub request: ForecastRequest,
}

/// Per-forecaster payload, tagged by `algorithm`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "algorithm", rename_all = "lowercase")]
pub enum ForecastRequest {
    Arima(AlgorithmInput),
    Knn(AlgorithmInput),
    Sarima(SeasonalRequest),
}

impl ForecastRequest {
    pub fn algorithm(&self) -> &'static str {
        match self {
            ForecastRequest::Arima(_) => "arima",
            ForecastRequest::Knn(_) => "knn",
            ForecastRequest::Sarima(_) => "sarima",
        }
    }

    pub fn validate(&self) -> InputResult<()> {
        match self {
            ForecastRequest::Arima(input) | ForecastRequest::Knn(input) => input.validate(),
            ForecastRequest::Sarima(request) => request.validate(),
        }
    }
}
