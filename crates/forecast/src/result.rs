use serde::{Deserialize, Serialize};

use stockpilot_core::{ItemId, ValueObject};
use stockpilot_inventory::Period;

/// Forecast for one future period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// 1-based distance from the last observed period.
    pub step: usize,
    pub period: Period,
    /// Expected usage; never negative.
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Forecast error variance at this step.
    pub variance: f64,
}

impl ValueObject for ForecastPoint {}

impl ForecastPoint {
    pub fn width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }
}

/// Parameters the model settled on (fixed or selected by grid search).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<usize>,
}

/// Point and uncertainty forecast of one item over a horizon.
///
/// Produced by a [`crate::ForecastModel`]; downstream stages only read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub item_id: ItemId,
    /// Name of the model that produced the forecast.
    pub model: String,
    pub horizon: usize,
    /// Coverage of `lower_bound..=upper_bound` (e.g. 0.95).
    pub interval_level: f64,
    /// Root mean squared one-step-ahead residual of the fit.
    pub residual_std: f64,
    pub parameters: ModelParameters,
    pub points: Vec<ForecastPoint>,
}

impl ValueObject for ForecastResult {}

impl ForecastResult {
    /// Sum of point estimates over the first `periods` steps.
    ///
    /// `None` when the window is longer than the horizon.
    pub fn demand_over(&self, periods: usize) -> Option<f64> {
        self.window(0, periods)
            .map(|pts| pts.iter().map(|p| p.point_estimate).sum())
    }

    /// Sum of variances over the first `periods` steps.
    pub fn variance_over(&self, periods: usize) -> Option<f64> {
        self.window(0, periods)
            .map(|pts| pts.iter().map(|p| p.variance).sum())
    }

    /// Steps `from+1 ..= from+len`, if all of them are inside the horizon.
    pub fn window(&self, from: usize, len: usize) -> Option<&[ForecastPoint]> {
        let end = from.checked_add(len)?;
        self.points.get(from..end)
    }

    pub fn point_at(&self, step: usize) -> Option<&ForecastPoint> {
        step.checked_sub(1).and_then(|i| self.points.get(i))
    }

    /// Average point estimate per period across the horizon.
    pub fn mean_point(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        self.points.iter().map(|p| p.point_estimate).sum::<f64>() / self.points.len() as f64
    }

    pub fn is_zero(&self) -> bool {
        self.points
            .iter()
            .all(|p| p.point_estimate == 0.0 && p.variance == 0.0)
    }
}
