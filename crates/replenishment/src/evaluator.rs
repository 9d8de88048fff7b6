//! Inventory State Evaluator.
//!
//! A stateless classifier: every call recomputes the health label from the
//! current on-hand quantity and forecast, with no memory of earlier cycles.

use serde::{Deserialize, Serialize};

use stockpilot_core::{EngineConfig, EngineError, EngineResult, ItemId, ValueObject};
use stockpilot_forecast::ForecastResult;

use crate::levels::{ForecastBook, ReplenishmentLevels, StockPosition};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockHealth {
    /// On hand is at or below the reorder point.
    Understock,
    Healthy,
    /// On hand exceeds `(lead-time demand + safety stock) × overstock multiplier`.
    Overstock,
}

/// Evaluated stock health of one item. Derived on every evaluation, never stored
/// as a source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryState {
    pub item_id: ItemId,
    pub on_hand_quantity: f64,
    pub classification: StockHealth,
    pub reorder_point: f64,
    pub safety_stock: f64,
    pub lead_time_demand: f64,
    /// How many forecast periods the on-hand quantity covers; `None` without demand.
    pub periods_of_cover: Option<f64>,
    /// Forecast demand per period over on-hand stock; `None` with nothing on hand.
    pub turnover: Option<f64>,
}

impl ValueObject for InventoryState {}

/// Map on-hand stock to exactly one health label.
///
/// Understock takes precedence, so the mapping stays total and exclusive even if the
/// overstock threshold were ever below the reorder point.
pub fn classify(on_hand: f64, levels: &ReplenishmentLevels, overstock_multiplier: f64) -> StockHealth {
    if on_hand <= levels.reorder_point {
        StockHealth::Understock
    } else if on_hand > (levels.lead_time_demand + levels.safety_stock) * overstock_multiplier {
        StockHealth::Overstock
    } else {
        StockHealth::Healthy
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StockEvaluator {
    lead_time: usize,
    service_level: f64,
    overstock_multiplier: f64,
}

impl StockEvaluator {
    pub fn new(lead_time: usize, service_level: f64, overstock_multiplier: f64) -> Self {
        Self {
            lead_time,
            service_level,
            overstock_multiplier,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.lead_time, config.service_level, config.overstock_multiplier)
    }

    /// Look up the item's forecast in `forecasts` and classify.
    pub fn evaluate(
        &self,
        position: &StockPosition,
        forecasts: &ForecastBook,
    ) -> EngineResult<InventoryState> {
        let forecast = forecasts.get(&position.item_id).ok_or_else(|| {
            EngineError::missing_forecast(&position.item_id, "no forecast produced for item")
        })?;
        self.evaluate_with(position, forecast)
    }

    pub fn evaluate_with(
        &self,
        position: &StockPosition,
        forecast: &ForecastResult,
    ) -> EngineResult<InventoryState> {
        position.check_against(forecast)?;
        let levels = ReplenishmentLevels::compute(forecast, self.lead_time, self.service_level)?;

        let mean_demand = forecast.mean_point();
        let periods_of_cover =
            (mean_demand > 0.0).then(|| position.on_hand_quantity / mean_demand);
        let turnover =
            (position.on_hand_quantity > 0.0).then(|| mean_demand / position.on_hand_quantity);

        Ok(InventoryState {
            item_id: position.item_id.clone(),
            on_hand_quantity: position.on_hand_quantity,
            classification: classify(position.on_hand_quantity, &levels, self.overstock_multiplier),
            reorder_point: levels.reorder_point,
            safety_stock: levels.safety_stock,
            lead_time_demand: levels.lead_time_demand,
            periods_of_cover,
            turnover,
        })
    }
}
