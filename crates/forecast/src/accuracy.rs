use serde::{Deserialize, Serialize};

use stockpilot_core::{EngineError, EngineResult};
use stockpilot_inventory::ItemSeries;

use crate::model::ForecastModel;
use crate::stats::mean;

/// Holdout accuracy of a model on one series.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    /// Mean absolute error over the held-out periods.
    pub mae: f64,
    /// Coefficient of determination; `None` when the holdout is constant.
    pub r2: Option<f64>,
    pub holdout: usize,
    pub training: usize,
}

/// Fit on the leading part of `series` and score the held-out tail.
///
/// The holdout is `round(len × holdout_fraction)` periods, at least one, and at
/// least two periods are always kept for training. Minimum-length rules of the
/// model do not apply here; only the fitting hook is used.
pub fn backtest(
    model: &dyn ForecastModel,
    series: &ItemSeries,
    holdout_fraction: f64,
) -> EngineResult<AccuracyReport> {
    let values = series.values();
    let holdout = ((values.len() as f64 * holdout_fraction).round() as usize).max(1);
    if values.len() < holdout + 2 {
        return Err(EngineError::insufficient_data(
            series.item_id(),
            holdout + 2,
            values.len(),
        ));
    }

    let training = values.len() - holdout;
    let (train, actual) = values.split_at(training);

    let predicted: Vec<f64> = if train.iter().all(|&v| v == 0.0) {
        vec![0.0; holdout]
    } else {
        model
            .fit(train, holdout)?
            .forecasts
            .into_iter()
            .map(|f| f.max(0.0))
            .collect()
    };

    let mae = actual
        .iter()
        .zip(&predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / holdout as f64;

    let actual_mean = mean(actual);
    let ss_tot: f64 = actual.iter().map(|a| (a - actual_mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(&predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let r2 = (ss_tot > 0.0).then(|| 1.0 - ss_res / ss_tot);

    Ok(AccuracyReport {
        mae,
        r2,
        holdout,
        training,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelSettings;
    use crate::moving_average::MovingAverage;
    use crate::smoothing::HoltLinear;
    use chrono::NaiveDate;
    use stockpilot_core::{Frequency, ItemId};

    fn series(values: &[f64]) -> ItemSeries {
        let item: ItemId = "SKU-1".parse().unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        ItemSeries::from_values(item, Frequency::Weekly, start, values).unwrap()
    }

    #[test]
    fn perfect_trend_scores_perfectly() {
        let model = HoltLinear::new(ModelSettings::default(), None, None);
        let values: Vec<f64> = (0..10).map(|i| 5.0 + 2.0 * i as f64).collect();
        let report = backtest(&model, &series(&values), 0.2).unwrap();
        assert_eq!(report.holdout, 2);
        assert_eq!(report.training, 8);
        assert!(report.mae < 1e-9);
        assert!((report.r2.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn constant_holdout_has_no_r2() {
        let model = MovingAverage::new(ModelSettings::default(), 2);
        let report = backtest(&model, &series(&[4.0, 6.0, 5.0, 5.0, 5.0]), 0.4).unwrap();
        assert_eq!(report.holdout, 2);
        assert_eq!(report.r2, None);
        // trained on [4, 6, 5]: trailing mean of [6, 5]
        assert!((report.mae - 0.5).abs() < 1e-12);
    }

    #[test]
    fn too_short_series_is_insufficient() {
        let model = MovingAverage::new(ModelSettings::default(), 2);
        let err = backtest(&model, &series(&[1.0, 2.0]), 0.2).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientData { required: 3, actual: 2, .. }));
    }
}
