//! phpa.toml configuration parser.
//!
//! Every section and field is optional; anything omitted falls back to the
//! defaults the forecasters were tuned with.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhpaConfig {
    pub arima: ArimaConfig,
    pub knn: KnnConfig,
    pub sarima: SarimaConfig,
    pub retention: RetentionConfig,
}

/// Walk-forward forecaster settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArimaConfig {
    /// Held-out tail length used for walk-forward validation.
    pub validation_window: usize,
    pub mode: ArimaMode,
}

impl Default for ArimaConfig {
    fn default() -> Self {
        Self {
            validation_window: 5,
            mode: ArimaMode::Validation,
        }
    }
}

/// How the walk-forward forecaster produces its answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArimaMode {
    /// One-step-ahead backtest over the held-out tail; answers with the
    /// final reconstructed prediction.
    #[default]
    Validation,
    /// Forecast `lookAhead` steps past the end of the history without
    /// revealing any held-out truth.
    Ahead,
}

impl FromStr for ArimaMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "validation" => Ok(ArimaMode::Validation),
            "ahead" => Ok(ArimaMode::Ahead),
            other => Err(format!("unknown mode '{other}', expected 'validation' or 'ahead'")),
        }
    }
}

impl fmt::Display for ArimaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArimaMode::Validation => f.write_str("validation"),
            ArimaMode::Ahead => f.write_str("ahead"),
        }
    }
}

/// Moving-average forecaster settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KnnConfig {
    /// Number of trailing deltas averaged per prediction.
    pub k: usize,
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self { k: 5 }
    }
}

/// Seasonal forecaster settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SarimaConfig {
    /// Location of the persisted model database.
    pub store_path: PathBuf,
    pub seasonal_period: usize,
    pub max_p: usize,
    pub max_q: usize,
    /// Upper bound on candidate fits evaluated by the order search.
    pub search_budget: usize,
    /// Simplex iterations spent refreshing coefficients on predict.
    pub update_iterations: usize,
    /// Observations retained in the persisted model.
    pub history_limit: usize,
}

impl Default for SarimaConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("/tmp/phpa-sarima.redb"),
            seasonal_period: 12,
            max_p: 3,
            max_q: 3,
            search_budget: 64,
            update_iterations: 10,
            history_limit: 1000,
        }
    }
}

/// Evaluation retention settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetentionConfig {
    /// Number of evaluations the controller keeps per model.
    pub stored_values: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self { stored_values: 60 }
    }
}

impl PhpaConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PhpaConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.knn.k == 0 {
            anyhow::bail!("knn.k must be at least 1");
        }
        if self.arima.validation_window == 0 {
            anyhow::bail!("arima.validation_window must be at least 1");
        }
        if self.sarima.seasonal_period < 2 {
            anyhow::bail!("sarima.seasonal_period must be at least 2");
        }
        if self.sarima.search_budget == 0 {
            anyhow::bail!("sarima.search_budget must be at least 1");
        }
        let min_history = 2 * self.sarima.seasonal_period + 2;
        if self.sarima.history_limit < min_history {
            anyhow::bail!(
                "sarima.history_limit must be at least {min_history} for seasonal_period {}",
                self.sarima.seasonal_period
            );
        }
        Ok(())
    }
}
