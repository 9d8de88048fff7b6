//! Lead-time demand, safety stock and reorder point.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use stockpilot_core::{
    EngineError, EngineResult, ItemId, ValueObject, ensure_quantity, validate_service_level,
};
use stockpilot_forecast::ForecastResult;
use stockpilot_forecast::stats::normal_quantile;
use stockpilot_inventory::ItemStatus;

/// Forecasts keyed by item, as handed over by the forecasting stage.
pub type ForecastBook = BTreeMap<ItemId, ForecastResult>;

/// Current stock of one item at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPosition {
    pub item_id: ItemId,
    pub on_hand_quantity: f64,
    #[serde(default)]
    pub status: ItemStatus,
}

impl ValueObject for StockPosition {}

impl StockPosition {
    pub fn new(item_id: ItemId, on_hand_quantity: f64) -> Self {
        Self {
            item_id,
            on_hand_quantity,
            status: ItemStatus::Active,
        }
    }

    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    /// On-hand must be finite and non-negative; the forecast must be for this item.
    pub(crate) fn check_against(&self, forecast: &ForecastResult) -> EngineResult<()> {
        ensure_quantity("on_hand_quantity", self.on_hand_quantity)?;
        if forecast.item_id != self.item_id {
            return Err(EngineError::invalid_input(format!(
                "forecast for item {} supplied for item {}",
                forecast.item_id, self.item_id
            )));
        }
        Ok(())
    }
}

/// Replenishment thresholds derived from a forecast.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplenishmentLevels {
    /// Sum of point estimates over the lead-time window.
    pub lead_time_demand: f64,
    /// `z(service_level) × √(Σ variance over lead time)`, floored at zero.
    pub safety_stock: f64,
    pub reorder_point: f64,
}

impl ValueObject for ReplenishmentLevels {}

impl ReplenishmentLevels {
    pub fn compute(
        forecast: &ForecastResult,
        lead_time: usize,
        service_level: f64,
    ) -> EngineResult<Self> {
        validate_service_level(service_level)?;

        let (Some(lead_time_demand), Some(lead_time_variance)) =
            (forecast.demand_over(lead_time), forecast.variance_over(lead_time))
        else {
            return Err(EngineError::missing_forecast(
                &forecast.item_id,
                format!(
                    "lead time of {lead_time} period(s) exceeds forecast horizon of {}",
                    forecast.points.len()
                ),
            ));
        };

        let z = normal_quantile(service_level)
            .ok_or(EngineError::InvalidServiceLevel(service_level))?;
        // Service levels below 0.5 give z < 0; a negative buffer is no buffer.
        let safety_stock = (z * lead_time_variance.max(0.0).sqrt()).max(0.0);
        let reorder_point = lead_time_demand + safety_stock;
        if !reorder_point.is_finite() {
            return Err(EngineError::invalid_input(format!(
                "reorder point of item {} overflows",
                forecast.item_id
            )));
        }

        Ok(Self {
            lead_time_demand,
            safety_stock,
            reorder_point,
        })
    }
}
