//! Simple moving average forecaster.

use stockpilot_core::{EngineError, EngineResult};

use crate::model::{ForecastModel, ModelFit, ModelSettings};
use crate::result::ModelParameters;
use crate::stats::{mean, mean_square};

/// Flat forecast at the mean of the trailing `window` observations.
///
/// Residuals are one-step errors against the trailing mean. Uncertainty grows
/// like SES with the equivalent smoothing weight `a = 2 / (window + 1)`:
/// `σ²·(1 + (h − 1)·a²)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverage {
    settings: ModelSettings,
    window: usize,
}

impl MovingAverage {
    pub fn new(settings: ModelSettings, window: usize) -> Self {
        Self {
            settings,
            window: window.max(1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl ForecastModel for MovingAverage {
    fn name(&self) -> &'static str {
        "moving_average"
    }

    fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    fn fit(&self, values: &[f64], horizon: usize) -> EngineResult<ModelFit> {
        if values.len() < 2 {
            return Err(EngineError::invalid_input(format!(
                "moving average needs at least 2 observations, got {}",
                values.len()
            )));
        }

        // Shorter histories use as much of the window as they can.
        let residual_window = self.window.min(values.len() - 1);
        let residuals: Vec<f64> = (residual_window..values.len())
            .map(|t| values[t] - mean(&values[t - residual_window..t]))
            .collect();
        let sigma2 = mean_square(&residuals);

        let forecast_window = self.window.min(values.len());
        let level = mean(&values[values.len() - forecast_window..]);

        let a = 2.0 / (forecast_window as f64 + 1.0);
        let variances = (1..=horizon)
            .map(|h| sigma2 * (1.0 + (h as f64 - 1.0) * a * a))
            .collect();

        Ok(ModelFit {
            forecasts: vec![level; horizon],
            variances,
            residual_variance: sigma2,
            parameters: ModelParameters {
                window: Some(forecast_window),
                ..ModelParameters::default()
            },
        })
    }
}
