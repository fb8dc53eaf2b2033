//! Seasonal ARIMA forecasting with a persisted model.

pub mod model;
pub mod optimize;
pub mod search;
pub mod service;

pub use model::{SarimaModel, SarimaOrder, SeasonalForecast};
pub use search::SearchSpace;
pub use service::{SeasonalService, TrainReport};
