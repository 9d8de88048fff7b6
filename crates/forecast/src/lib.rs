//! `stockpilot-forecast`
//!
//! **Responsibility:** per-item demand forecasting.
//!
//! - Models are pluggable behind [`ForecastModel`]; the rest of the engine only
//!   consumes [`ForecastResult`].
//! - Everything here is deterministic: the same series and configuration always
//!   yield a bit-identical forecast.
//! - Nothing here knows about on-hand stock or reorder decisions.

pub mod accuracy;
pub mod model;
pub mod moving_average;
pub mod result;
pub mod smoothing;
pub mod stats;
pub mod trend;

pub use accuracy::{AccuracyReport, backtest};
pub use model::{ForecastModel, ModelFit, ModelSettings, model_for};
pub use moving_average::MovingAverage;
pub use result::{ForecastPoint, ForecastResult, ModelParameters};
pub use smoothing::{HoltLinear, SimpleExponentialSmoothing};
pub use trend::{TrendDirection, TrendReport, detect_trend};
