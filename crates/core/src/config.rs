//! Configuration surface shared by every planning stage.
//!
//! One immutable `EngineConfig` is validated up front and then shared by
//! reference across all per-item pipelines.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EngineError, EngineResult};

/// Prefix of the environment variables read by [`EngineConfig::from_env`].
pub const ENV_PREFIX: &str = "STOCKPILOT_";

/// Sampling frequency of an item series.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl FromStr for Frequency {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" | "d" => Ok(Frequency::Daily),
            "weekly" | "week" | "w" => Ok(Frequency::Weekly),
            "monthly" | "month" | "m" => Ok(Frequency::Monthly),
            other => Err(EngineError::invalid_config(format!("unknown frequency: {other}"))),
        }
    }
}

/// How missing periods between the first and last observation are filled.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapFillPolicy {
    /// Missing periods had no usage.
    ZeroFill,
    /// Missing periods repeat the previous period's usage.
    ForwardFill,
    /// Missing periods are linearly interpolated between observed neighbours.
    Interpolate,
}

impl FromStr for GapFillPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "zero_fill" | "zero" => Ok(GapFillPolicy::ZeroFill),
            "forward_fill" | "ffill" => Ok(GapFillPolicy::ForwardFill),
            "interpolate" | "linear" => Ok(GapFillPolicy::Interpolate),
            other => Err(EngineError::invalid_config(format!("unknown gap fill policy: {other}"))),
        }
    }
}

/// Forecasting strategy used for every item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    SimpleExponentialSmoothing,
    HoltLinear,
    MovingAverage,
}

impl FromStr for ModelKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "simple_exponential_smoothing" | "ses" => Ok(ModelKind::SimpleExponentialSmoothing),
            "holt_linear" | "holt" => Ok(ModelKind::HoltLinear),
            "moving_average" | "sma" => Ok(ModelKind::MovingAverage),
            other => Err(EngineError::invalid_config(format!("unknown model: {other}"))),
        }
    }
}

/// Smoothing parameters. `None` means "select by grid search on the series".
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingParams {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of periods forecast ahead.
    pub forecast_horizon: usize,
    pub frequency: Frequency,
    pub gap_fill_policy: GapFillPolicy,
    /// Target probability of not stocking out during lead time, in (0, 1).
    pub service_level: f64,
    /// Periods between placing and receiving an order.
    pub lead_time: usize,
    /// Periods between successive reorder decisions.
    pub review_period: usize,
    pub overstock_multiplier: f64,
    /// Minimum series length; defaults to twice the forecast horizon.
    pub min_periods: Option<usize>,
    pub model: ModelKind,
    pub smoothing: SmoothingParams,
    pub moving_average_window: usize,
    /// Confidence level of the forecast bounds.
    pub interval_level: f64,
    /// Rolling window of the trend detector.
    pub trend_window: usize,
    /// Share of the series held out when scoring forecast accuracy.
    pub holdout_fraction: f64,
    /// Worker threads used by the batch planner.
    pub max_workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            forecast_horizon: 12,
            frequency: Frequency::Weekly,
            gap_fill_policy: GapFillPolicy::ZeroFill,
            service_level: 0.95,
            lead_time: 2,
            review_period: 1,
            overstock_multiplier: 2.0,
            min_periods: None,
            model: ModelKind::SimpleExponentialSmoothing,
            smoothing: SmoothingParams::default(),
            moving_average_window: 4,
            interval_level: 0.95,
            trend_window: 5,
            holdout_fraction: 0.2,
            max_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

impl EngineConfig {
    /// Effective minimum number of periods a series must cover.
    pub fn min_periods(&self) -> usize {
        self.min_periods
            .unwrap_or(self.forecast_horizon.saturating_mul(2))
    }

    pub fn with_forecast_horizon(mut self, horizon: usize) -> Self {
        self.forecast_horizon = horizon;
        self
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_gap_fill_policy(mut self, policy: GapFillPolicy) -> Self {
        self.gap_fill_policy = policy;
        self
    }

    pub fn with_service_level(mut self, service_level: f64) -> Self {
        self.service_level = service_level;
        self
    }

    pub fn with_lead_time(mut self, lead_time: usize) -> Self {
        self.lead_time = lead_time;
        self
    }

    pub fn with_review_period(mut self, review_period: usize) -> Self {
        self.review_period = review_period;
        self
    }

    pub fn with_overstock_multiplier(mut self, multiplier: f64) -> Self {
        self.overstock_multiplier = multiplier;
        self
    }

    pub fn with_min_periods(mut self, min_periods: usize) -> Self {
        self.min_periods = Some(min_periods);
        self
    }

    pub fn with_model(mut self, model: ModelKind) -> Self {
        self.model = model;
        self
    }

    pub fn with_smoothing(mut self, alpha: Option<f64>, beta: Option<f64>) -> Self {
        self.smoothing = SmoothingParams { alpha, beta };
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Check every field; the first problem found is returned.
    pub fn validate(&self) -> EngineResult<()> {
        validate_service_level(self.service_level)?;

        if self.forecast_horizon == 0 {
            return Err(EngineError::invalid_config("forecast_horizon must be >= 1"));
        }
        if self.min_periods() < 2 {
            return Err(EngineError::invalid_config(
                "min_periods must be >= 2 to estimate residual variance",
            ));
        }
        if !(self.overstock_multiplier.is_finite() && self.overstock_multiplier >= 1.0) {
            return Err(EngineError::invalid_config(
                "overstock_multiplier must be a finite number >= 1.0",
            ));
        }
        if !(self.interval_level > 0.0 && self.interval_level < 1.0) {
            return Err(EngineError::invalid_config(
                "interval_level must lie strictly between 0 and 1",
            ));
        }
        for (name, value) in [("alpha", self.smoothing.alpha), ("beta", self.smoothing.beta)] {
            if let Some(v) = value {
                if !(v > 0.0 && v < 1.0) {
                    return Err(EngineError::invalid_config(format!(
                        "smoothing {name} must lie strictly between 0 and 1 (got {v})"
                    )));
                }
            }
        }
        if self.moving_average_window < 1 {
            return Err(EngineError::invalid_config("moving_average_window must be >= 1"));
        }
        if self.trend_window < 2 {
            return Err(EngineError::invalid_config("trend_window must be >= 2"));
        }
        if !(self.holdout_fraction > 0.0 && self.holdout_fraction < 1.0) {
            return Err(EngineError::invalid_config(
                "holdout_fraction must lie strictly between 0 and 1",
            ));
        }
        if self.max_workers == 0 {
            return Err(EngineError::invalid_config("max_workers must be >= 1"));
        }
        Ok(())
    }

    /// Parse a JSON document; absent fields take their defaults.
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| EngineError::invalid_config(format!("malformed config json: {e}")))
    }

    /// Defaults overlaid with `STOCKPILOT_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup` (keyed by full variable name).
    ///
    /// Values that fail to parse are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        overlay(&lookup, "FORECAST_HORIZON", &mut cfg.forecast_horizon);
        overlay(&lookup, "FREQUENCY", &mut cfg.frequency);
        overlay(&lookup, "GAP_FILL_POLICY", &mut cfg.gap_fill_policy);
        overlay(&lookup, "SERVICE_LEVEL", &mut cfg.service_level);
        overlay(&lookup, "LEAD_TIME", &mut cfg.lead_time);
        overlay(&lookup, "REVIEW_PERIOD", &mut cfg.review_period);
        overlay(&lookup, "OVERSTOCK_MULTIPLIER", &mut cfg.overstock_multiplier);
        overlay(&lookup, "MODEL", &mut cfg.model);
        overlay(&lookup, "MOVING_AVERAGE_WINDOW", &mut cfg.moving_average_window);
        overlay(&lookup, "INTERVAL_LEVEL", &mut cfg.interval_level);
        overlay(&lookup, "TREND_WINDOW", &mut cfg.trend_window);
        overlay(&lookup, "HOLDOUT_FRACTION", &mut cfg.holdout_fraction);
        overlay(&lookup, "MAX_WORKERS", &mut cfg.max_workers);

        let mut min_periods = 0usize;
        if overlay(&lookup, "MIN_PERIODS", &mut min_periods) {
            cfg.min_periods = Some(min_periods);
        }
        let mut alpha = 0.0f64;
        if overlay(&lookup, "ALPHA", &mut alpha) {
            cfg.smoothing.alpha = Some(alpha);
        }
        let mut beta = 0.0f64;
        if overlay(&lookup, "BETA", &mut beta) {
            cfg.smoothing.beta = Some(beta);
        }

        cfg
    }
}

/// Service level must lie in the open interval (0, 1).
pub fn validate_service_level(service_level: f64) -> EngineResult<()> {
    if service_level > 0.0 && service_level < 1.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidServiceLevel(service_level))
    }
}

fn overlay<F, T>(lookup: &F, suffix: &str, slot: &mut T) -> bool
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: core::fmt::Display,
{
    let key = format!("{ENV_PREFIX}{suffix}");
    let Some(raw) = lookup(&key) else {
        return false;
    };
    match raw.trim().parse::<T>() {
        Ok(v) => {
            *slot = v;
            true
        }
        Err(e) => {
            warn!(variable = %key, value = %raw, error = %e, "ignoring unparsable config variable");
            false
        }
    }
}
