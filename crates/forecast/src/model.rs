use tracing::debug;

use stockpilot_core::{EngineConfig, EngineError, EngineResult, ModelKind};
use stockpilot_inventory::ItemSeries;

use crate::moving_average::MovingAverage;
use crate::result::{ForecastPoint, ForecastResult, ModelParameters};
use crate::smoothing::{HoltLinear, SimpleExponentialSmoothing};
use crate::stats::two_sided_z;

/// Settings shared by every model implementation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ModelSettings {
    /// Series shorter than this are rejected with `InsufficientData`.
    pub min_periods: usize,
    /// Coverage of the forecast bounds.
    pub interval_level: f64,
}

impl ModelSettings {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            min_periods: config.min_periods(),
            interval_level: config.interval_level,
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            min_periods: 2,
            interval_level: 0.95,
        }
    }
}

/// Raw output of fitting a model to a value slice.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFit {
    /// Unclamped forecast per step (`horizon` entries).
    pub forecasts: Vec<f64>,
    /// Forecast error variance per step; non-decreasing.
    pub variances: Vec<f64>,
    /// Mean squared one-step-ahead residual.
    pub residual_variance: f64,
    pub parameters: ModelParameters,
}

/// Pluggable forecasting strategy.
///
/// The evaluator and reorder engine only see [`ForecastResult`], so models can be
/// swapped without touching them. Implementations must be deterministic.
pub trait ForecastModel: Send + Sync {
    /// Stable model name recorded on every result.
    fn name(&self) -> &'static str;

    fn settings(&self) -> &ModelSettings;

    /// Fit on `values` (at least two) and project `horizon` steps.
    fn fit(&self, values: &[f64], horizon: usize) -> EngineResult<ModelFit>;

    /// Fit the series and produce point and interval forecasts.
    fn fit_and_forecast(&self, series: &ItemSeries, horizon: usize) -> EngineResult<ForecastResult> {
        let settings = *self.settings();
        let required = settings.min_periods.max(2);
        if series.len() < required {
            return Err(EngineError::insufficient_data(
                series.item_id(),
                required,
                series.len(),
            ));
        }
        if horizon == 0 {
            return Err(EngineError::invalid_config("forecast horizon must be >= 1"));
        }

        if series.is_all_zero() {
            debug!(item = %series.item_id(), model = self.name(), "all-zero series; zero forecast");
            let fit = ModelFit {
                forecasts: vec![0.0; horizon],
                variances: vec![0.0; horizon],
                residual_variance: 0.0,
                parameters: ModelParameters::default(),
            };
            return assemble(self.name(), series, horizon, settings, fit);
        }

        let fit = self.fit(&series.values(), horizon)?;
        debug!(
            item = %series.item_id(),
            model = self.name(),
            residual_variance = fit.residual_variance,
            alpha = ?fit.parameters.alpha,
            beta = ?fit.parameters.beta,
            "fitted forecast model"
        );
        assemble(self.name(), series, horizon, settings, fit)
    }
}

/// Build the configured model.
pub fn model_for(config: &EngineConfig) -> Box<dyn ForecastModel> {
    let settings = ModelSettings::from_config(config);
    match config.model {
        ModelKind::SimpleExponentialSmoothing => Box::new(SimpleExponentialSmoothing::new(
            settings,
            config.smoothing.alpha,
        )),
        ModelKind::HoltLinear => Box::new(HoltLinear::new(
            settings,
            config.smoothing.alpha,
            config.smoothing.beta,
        )),
        ModelKind::MovingAverage => {
            Box::new(MovingAverage::new(settings, config.moving_average_window))
        }
    }
}

fn assemble(
    model: &'static str,
    series: &ItemSeries,
    horizon: usize,
    settings: ModelSettings,
    fit: ModelFit,
) -> EngineResult<ForecastResult> {
    if fit.forecasts.len() != horizon || fit.variances.len() != horizon {
        return Err(EngineError::invalid_input(format!(
            "model {model} produced {} forecasts / {} variances for horizon {horizon}",
            fit.forecasts.len(),
            fit.variances.len()
        )));
    }
    if let Some(step) = fit
        .forecasts
        .iter()
        .zip(&fit.variances)
        .position(|(f, v)| !(f.is_finite() && v.is_finite()))
    {
        return Err(EngineError::invalid_input(format!(
            "model {model} diverged for item {} at step {}; usage magnitudes are out of range",
            series.item_id(),
            step + 1
        )));
    }
    let z = two_sided_z(settings.interval_level).ok_or_else(|| {
        EngineError::invalid_config(format!("interval level {} outside (0, 1)", settings.interval_level))
    })?;
    let last = series.last_period().ok_or_else(|| {
        EngineError::insufficient_data(series.item_id(), settings.min_periods.max(2), 0)
    })?;

    let mut points = Vec::with_capacity(horizon);
    let mut period = last;
    for (i, (&raw, &variance)) in fit.forecasts.iter().zip(&fit.variances).enumerate() {
        period = period.next(series.frequency())?;
        let point_estimate = raw.max(0.0);
        let half_width = z * variance.max(0.0).sqrt();
        points.push(ForecastPoint {
            step: i + 1,
            period,
            point_estimate,
            lower_bound: point_estimate - half_width,
            upper_bound: point_estimate + half_width,
            variance,
        });
    }

    Ok(ForecastResult {
        item_id: series.item_id().clone(),
        model: model.to_string(),
        horizon,
        interval_level: settings.interval_level,
        residual_std: fit.residual_variance.sqrt(),
        parameters: fit.parameters,
        points,
    })
}
