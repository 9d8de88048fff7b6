use serde::{Deserialize, Serialize};

use stockpilot_inventory::ItemSeries;

use crate::stats::{mean, stddev_sample};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Flat,
    InsufficientData,
}

/// Overall demand trend of a series.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub direction: TrendDirection,
    /// Relative change between the first and last rolling mean (0.25 = 25%).
    pub strength: f64,
    /// Rolling window actually used.
    pub window: usize,
    /// Mean usage per period over the whole series.
    pub mean_demand: f64,
    /// Sample standard deviation of usage per period.
    pub demand_std: f64,
}

impl TrendReport {
    /// `demand_std / mean_demand`; `None` for a series without usage.
    pub fn coefficient_of_variation(&self) -> Option<f64> {
        (self.mean_demand > 0.0).then(|| self.demand_std / self.mean_demand)
    }
}

/// Compare the first and last rolling means of `series`.
///
/// The window shrinks to the series length; fewer than two rolling means yields
/// `InsufficientData`. A rise from a zero baseline reports strength 1.0.
pub fn detect_trend(series: &ItemSeries, window: usize) -> TrendReport {
    let values = series.values();
    let window = window.min(values.len());
    let mean_demand = mean(&values);
    let demand_std = stddev_sample(&values, mean_demand);
    let insufficient = TrendReport {
        direction: TrendDirection::InsufficientData,
        strength: 0.0,
        window,
        mean_demand,
        demand_std,
    };
    if window < 2 {
        return insufficient;
    }

    let rolling: Vec<f64> = values.windows(window).map(mean).collect();
    if rolling.len() < 2 {
        return insufficient;
    }
    let (start, end) = (rolling[0], rolling[rolling.len() - 1]);

    let delta = end - start;
    if delta.abs() <= f64::EPSILON * start.abs().max(1.0) {
        return TrendReport {
            direction: TrendDirection::Flat,
            strength: 0.0,
            window,
            mean_demand,
            demand_std,
        };
    }

    let strength = if start > 0.0 { delta.abs() / start } else { 1.0 };
    let direction = if delta > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };
    TrendReport {
        direction,
        strength,
        window,
        mean_demand,
        demand_std,
    }
}
