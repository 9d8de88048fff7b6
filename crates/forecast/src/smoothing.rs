//! Exponential smoothing models.
//!
//! - **Simple (SES)**: level only; flat forecast. Default model.
//! - **Holt linear**: level + trend; forecast extends the trend.
//!
//! Parameters are either fixed by configuration or chosen by an exhaustive grid
//! search minimising the one-step-ahead squared error. The grid is fixed and ties
//! resolve to the smallest parameter, so selection is deterministic.

use stockpilot_core::{EngineError, EngineResult};

use crate::model::{ForecastModel, ModelFit, ModelSettings};
use crate::result::ModelParameters;
use crate::stats::mean_square;

/// Candidate smoothing parameters: 0.05, 0.10, ..., 0.95.
fn grid() -> impl Iterator<Item = f64> {
    (1..=19).map(|i| i as f64 * 0.05)
}

fn ensure_values(values: &[f64]) -> EngineResult<()> {
    if values.len() < 2 {
        return Err(EngineError::invalid_input(format!(
            "smoothing needs at least 2 observations, got {}",
            values.len()
        )));
    }
    Ok(())
}

/// Simple exponential smoothing: `l_t = α·y_t + (1 − α)·l_{t−1}`, `l_0 = y_0`.
///
/// h-step variance: `σ²·(1 + (h − 1)·α²)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleExponentialSmoothing {
    settings: ModelSettings,
    alpha: Option<f64>,
}

impl SimpleExponentialSmoothing {
    /// `alpha = None` selects alpha by grid search.
    pub fn new(settings: ModelSettings, alpha: Option<f64>) -> Self {
        Self { settings, alpha }
    }

    /// Final level and one-step residuals for a given alpha.
    fn run(values: &[f64], alpha: f64) -> (f64, Vec<f64>) {
        let mut level = values[0];
        let mut residuals = Vec::with_capacity(values.len() - 1);
        for &y in &values[1..] {
            residuals.push(y - level);
            level = alpha * y + (1.0 - alpha) * level;
        }
        (level, residuals)
    }

    fn select_alpha(values: &[f64]) -> f64 {
        let mut best = (f64::INFINITY, 0.05);
        for alpha in grid() {
            let (_, residuals) = Self::run(values, alpha);
            let mse = mean_square(&residuals);
            if mse < best.0 {
                best = (mse, alpha);
            }
        }
        best.1
    }
}

impl ForecastModel for SimpleExponentialSmoothing {
    fn name(&self) -> &'static str {
        "simple_exponential_smoothing"
    }

    fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    fn fit(&self, values: &[f64], horizon: usize) -> EngineResult<ModelFit> {
        ensure_values(values)?;
        let alpha = self.alpha.unwrap_or_else(|| Self::select_alpha(values));
        let (level, residuals) = Self::run(values, alpha);
        let sigma2 = mean_square(&residuals);

        let variances = (1..=horizon)
            .map(|h| sigma2 * (1.0 + (h as f64 - 1.0) * alpha * alpha))
            .collect();

        Ok(ModelFit {
            forecasts: vec![level; horizon],
            variances,
            residual_variance: sigma2,
            parameters: ModelParameters {
                alpha: Some(alpha),
                ..ModelParameters::default()
            },
        })
    }
}

/// Holt's linear trend method.
///
/// ```text
/// l_t = α·y_t + (1 − α)·(l_{t−1} + b_{t−1})
/// b_t = β·(l_t − l_{t−1}) + (1 − β)·b_{t−1}
/// ŷ_{t+h} = l_t + h·b_t
/// ```
///
/// Initialised with `l_1 = y_1`, `b_1 = y_1 − y_0`. h-step variance:
/// `σ²·(1 + Σ_{j=1}^{h−1} (α·(1 + j·β))²)`.
#[derive(Debug, Clone, PartialEq)]
pub struct HoltLinear {
    settings: ModelSettings,
    alpha: Option<f64>,
    beta: Option<f64>,
}

impl HoltLinear {
    pub fn new(settings: ModelSettings, alpha: Option<f64>, beta: Option<f64>) -> Self {
        Self {
            settings,
            alpha,
            beta,
        }
    }

    /// Final (level, trend) and one-step residuals.
    fn run(values: &[f64], alpha: f64, beta: f64) -> (f64, f64, Vec<f64>) {
        let mut level = values[1];
        let mut trend = values[1] - values[0];
        let mut residuals = Vec::with_capacity(values.len().saturating_sub(2));
        for &y in &values[2..] {
            residuals.push(y - (level + trend));
            let prev_level = level;
            level = alpha * y + (1.0 - alpha) * (level + trend);
            trend = beta * (level - prev_level) + (1.0 - beta) * trend;
        }
        (level, trend, residuals)
    }

    fn select(values: &[f64], alpha: Option<f64>, beta: Option<f64>) -> (f64, f64) {
        let alphas: Vec<f64> = alpha.map(|a| vec![a]).unwrap_or_else(|| grid().collect());
        let betas: Vec<f64> = beta.map(|b| vec![b]).unwrap_or_else(|| grid().collect());

        let mut best = (f64::INFINITY, alphas[0], betas[0]);
        for &a in &alphas {
            for &b in &betas {
                let (_, _, residuals) = Self::run(values, a, b);
                let mse = mean_square(&residuals);
                if mse < best.0 {
                    best = (mse, a, b);
                }
            }
        }
        (best.1, best.2)
    }
}

impl ForecastModel for HoltLinear {
    fn name(&self) -> &'static str {
        "holt_linear"
    }

    fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    fn fit(&self, values: &[f64], horizon: usize) -> EngineResult<ModelFit> {
        ensure_values(values)?;
        let (alpha, beta) = Self::select(values, self.alpha, self.beta);
        let (level, trend, residuals) = Self::run(values, alpha, beta);
        let sigma2 = mean_square(&residuals);

        let forecasts = (1..=horizon).map(|h| level + h as f64 * trend).collect();

        let mut variances = Vec::with_capacity(horizon);
        let mut cumulative = 1.0;
        for h in 1..=horizon {
            if h > 1 {
                let c = alpha * (1.0 + (h - 1) as f64 * beta);
                cumulative += c * c;
            }
            variances.push(sigma2 * cumulative);
        }

        Ok(ModelFit {
            forecasts,
            variances,
            residual_variance: sigma2,
            parameters: ModelParameters {
                alpha: Some(alpha),
                beta: Some(beta),
                window: None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stockpilot_core::{Frequency, ItemId};
    use stockpilot_inventory::ItemSeries;

    fn series(values: &[f64]) -> ItemSeries {
        let item: ItemId = "SKU-1".parse().unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        ItemSeries::from_values(item, Frequency::Weekly, start, values).unwrap()
    }

    fn settings() -> ModelSettings {
        ModelSettings {
            min_periods: 4,
            interval_level: 0.95,
        }
    }

    #[test]
    fn ses_with_fixed_alpha_tracks_the_level() {
        let model = SimpleExponentialSmoothing::new(settings(), Some(0.5));
        let fit = model.fit(&[10.0, 20.0, 20.0], 2).unwrap();
        // 10 -> 15 -> 17.5
        assert!((fit.forecasts[0] - 17.5).abs() < 1e-12);
        assert_eq!(fit.forecasts[0], fit.forecasts[1]);
        // residuals 10, 5 -> mse 62.5
        assert!((fit.residual_variance - 62.5).abs() < 1e-12);
        assert!((fit.variances[1] - 62.5 * 1.25).abs() < 1e-9);
    }

    #[test]
    fn ses_grid_search_prefers_low_alpha_for_noisy_flat_series() {
        let model = SimpleExponentialSmoothing::new(settings(), None);
        let fit = model.fit(&[10.0, 12.0, 9.0, 11.0, 10.0, 13.0, 10.0], 4).unwrap();
        let alpha = fit.parameters.alpha.unwrap();
        assert!(alpha <= 0.2, "alpha={alpha}");
        assert!(fit.forecasts[0] > 10.0 && fit.forecasts[0] < 11.0);
    }

    #[test]
    fn holt_extends_a_linear_trend() {
        let model = HoltLinear::new(settings(), None, None);
        let result = model
            .fit_and_forecast(&series(&[10.0, 12.0, 14.0, 16.0, 18.0, 20.0]), 3)
            .unwrap();
        let pts: Vec<f64> = result.points.iter().map(|p| p.point_estimate).collect();
        assert!((pts[0] - 22.0).abs() < 1e-9);
        assert!((pts[2] - 26.0).abs() < 1e-9);
        // perfect fit -> no residual variance
        assert_eq!(result.residual_std, 0.0);
    }

    #[test]
    fn holt_clamps_negative_projections_to_zero() {
        let model = HoltLinear::new(settings(), Some(0.9), Some(0.9));
        let result = model.fit_and_forecast(&series(&[9.0, 6.0, 3.0, 1.0]), 5).unwrap();
        assert!(result.points.iter().all(|p| p.point_estimate >= 0.0));
        assert_eq!(result.points[4].point_estimate, 0.0);
    }

    #[test]
    fn holt_variance_is_non_decreasing() {
        let model = HoltLinear::new(settings(), None, None);
        let fit = model.fit(&[5.0, 9.0, 4.0, 12.0, 7.0, 15.0, 6.0], 6).unwrap();
        for pair in fit.variances.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn fit_rejects_single_value() {
        let model = SimpleExponentialSmoothing::new(settings(), None);
        assert!(matches!(model.fit(&[3.0], 2), Err(EngineError::InvalidInput(_))));
    }
}
