//! Reorder Engine.

use serde::{Deserialize, Serialize};
use tracing::debug;

use stockpilot_core::{EngineConfig, EngineError, EngineResult, ItemId, ValueObject};
use stockpilot_forecast::ForecastResult;
use stockpilot_inventory::ItemStatus;

use crate::levels::{ForecastBook, ReplenishmentLevels, StockPosition};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerReason {
    /// On hand is at or below the reorder point.
    BelowReorderPoint,
    /// Above the reorder point, but not enough to last until the next review.
    ProjectedShortfall,
    SufficientStock,
    /// The item is not replenished.
    Inactive,
}

/// Replenishment decision for one item in one evaluation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderRecommendation {
    pub item_id: ItemId,
    /// Never negative.
    pub recommended_quantity: f64,
    pub trigger_reason: TriggerReason,
    /// Target service level the quantity was sized for.
    pub confidence_level: f64,
    pub reorder_point: f64,
    pub safety_stock: f64,
    pub lead_time_demand: f64,
    pub review_period_demand: f64,
}

impl ValueObject for ReorderRecommendation {}

impl ReorderRecommendation {
    /// Quantity rounded up to whole units.
    pub fn order_units(&self) -> u64 {
        self.recommended_quantity.ceil() as u64
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ReorderEngine {
    lead_time: usize,
    review_period: usize,
    service_level: f64,
}

impl ReorderEngine {
    pub fn new(lead_time: usize, review_period: usize, service_level: f64) -> Self {
        Self {
            lead_time,
            review_period,
            service_level,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.lead_time, config.review_period, config.service_level)
    }

    /// Recommend using the item's entry in `forecasts`.
    pub fn recommend_from_book(
        &self,
        position: &StockPosition,
        forecasts: &ForecastBook,
    ) -> EngineResult<ReorderRecommendation> {
        let forecast = forecasts.get(&position.item_id).ok_or_else(|| {
            EngineError::missing_forecast(&position.item_id, "no forecast produced for item")
        })?;
        self.recommend(position, forecast)
    }

    /// `max(0, reorder_point + review_period_demand − on_hand)`.
    ///
    /// Reads the forecast and position only; on-hand inventory is never adjusted here.
    pub fn recommend(
        &self,
        position: &StockPosition,
        forecast: &ForecastResult,
    ) -> EngineResult<ReorderRecommendation> {
        position.check_against(forecast)?;
        let levels = ReplenishmentLevels::compute(forecast, self.lead_time, self.service_level)?;
        let review_period_demand = self.review_period_demand(forecast);

        let (recommended_quantity, trigger_reason) = if position.status == ItemStatus::Inactive {
            (0.0, TriggerReason::Inactive)
        } else {
            let on_hand = position.on_hand_quantity;
            let quantity = (levels.reorder_point + review_period_demand - on_hand).max(0.0);
            if !quantity.is_finite() {
                return Err(EngineError::invalid_input(format!(
                    "order quantity of item {} overflows",
                    position.item_id
                )));
            }
            let reason = if quantity <= 0.0 {
                TriggerReason::SufficientStock
            } else if on_hand <= levels.reorder_point {
                TriggerReason::BelowReorderPoint
            } else {
                TriggerReason::ProjectedShortfall
            };
            (quantity, reason)
        };

        debug!(
            item = %position.item_id,
            on_hand = position.on_hand_quantity,
            reorder_point = levels.reorder_point,
            quantity = recommended_quantity,
            reason = ?trigger_reason,
            "reorder recommendation"
        );

        Ok(ReorderRecommendation {
            item_id: position.item_id.clone(),
            recommended_quantity,
            trigger_reason,
            confidence_level: self.service_level,
            reorder_point: levels.reorder_point,
            safety_stock: levels.safety_stock,
            lead_time_demand: levels.lead_time_demand,
            review_period_demand,
        })
    }

    /// Demand over the review period that follows the lead time.
    ///
    /// Steps past the horizon repeat the last available point estimate.
    fn review_period_demand(&self, forecast: &ForecastResult) -> f64 {
        let last = forecast
            .points
            .last()
            .map(|p| p.point_estimate)
            .unwrap_or(0.0);
        (self.lead_time..self.lead_time + self.review_period)
            .map(|i| forecast.points.get(i).map_or(last, |p| p.point_estimate))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{flat_forecast, item};
    use proptest::prelude::*;

    fn engine() -> ReorderEngine {
        ReorderEngine::new(2, 1, 0.95)
    }

    #[test]
    fn below_reorder_point_orders_up_to_cover_review_period() {
        let forecast = flat_forecast("SKU-1", 10.0, &[0.0; 4]);
        let rec = engine()
            .recommend(&StockPosition::new(item("SKU-1"), 15.0), &forecast)
            .unwrap();
        assert_eq!(rec.reorder_point, 20.0);
        assert_eq!(rec.review_period_demand, 10.0);
        assert_eq!(rec.recommended_quantity, 15.0);
        assert_eq!(rec.trigger_reason, TriggerReason::BelowReorderPoint);
        assert_eq!(rec.confidence_level, 0.95);
    }

    #[test]
    fn above_reorder_point_but_short_for_review_is_projected_shortfall() {
        let forecast = flat_forecast("SKU-1", 10.0, &[0.0; 4]);
        let rec = engine()
            .recommend(&StockPosition::new(item("SKU-1"), 25.0), &forecast)
            .unwrap();
        assert_eq!(rec.recommended_quantity, 5.0);
        assert_eq!(rec.trigger_reason, TriggerReason::ProjectedShortfall);
    }

    #[test]
    fn well_stocked_item_orders_nothing() {
        let forecast = flat_forecast("SKU-1", 10.0, &[0.0; 4]);
        let rec = engine()
            .recommend(&StockPosition::new(item("SKU-1"), 80.0), &forecast)
            .unwrap();
        assert_eq!(rec.recommended_quantity, 0.0);
        assert_eq!(rec.trigger_reason, TriggerReason::SufficientStock);
    }

    #[test]
    fn inactive_item_is_never_reordered() {
        let forecast = flat_forecast("SKU-1", 10.0, &[0.0; 4]);
        let position = StockPosition::new(item("SKU-1"), 0.0).with_status(ItemStatus::Inactive);
        let rec = engine().recommend(&position, &forecast).unwrap();
        assert_eq!(rec.recommended_quantity, 0.0);
        assert_eq!(rec.trigger_reason, TriggerReason::Inactive);
        assert_eq!(rec.reorder_point, 20.0);
    }

    #[test]
    fn review_window_past_the_horizon_repeats_last_point() {
        let forecast = flat_forecast("SKU-1", 10.0, &[0.0; 2]);
        let rec = ReorderEngine::new(2, 3, 0.95)
            .recommend(&StockPosition::new(item("SKU-1"), 0.0), &forecast)
            .unwrap();
        assert_eq!(rec.review_period_demand, 30.0);
        assert_eq!(rec.recommended_quantity, 50.0);
        assert_eq!(rec.order_units(), 50);
    }

    #[test]
    fn lead_time_past_the_horizon_is_missing_forecast() {
        let forecast = flat_forecast("SKU-1", 10.0, &[0.0; 2]);
        let err = ReorderEngine::new(3, 1, 0.95)
            .recommend(&StockPosition::new(item("SKU-1"), 0.0), &forecast)
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingForecast { .. }));
    }

    #[test]
    fn zero_forecast_recommends_nothing() {
        let forecast = flat_forecast("SKU-1", 0.0, &[0.0; 4]);
        for on_hand in [0.0, 3.0, 100.0] {
            let rec = engine()
                .recommend(&StockPosition::new(item("SKU-1"), on_hand), &forecast)
                .unwrap();
            assert_eq!(rec.recommended_quantity, 0.0);
            assert_eq!(rec.trigger_reason, TriggerReason::SufficientStock);
        }
    }

    #[test]
    fn overflowing_order_quantity_is_invalid_input() {
        let forecast = flat_forecast("SKU-1", f64::MAX / 2.0, &[0.0; 4]);
        let err = ReorderEngine::new(1, 2, 0.95)
            .recommend(&StockPosition::new(item("SKU-1"), 0.0), &forecast)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(msg) if msg.contains("order quantity")));
    }

    #[test]
    fn missing_book_entry_is_missing_forecast() {
        let err = engine()
            .recommend_from_book(&StockPosition::new(item("SKU-1"), 1.0), &ForecastBook::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingForecast { .. }));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: service levels outside (0, 1) always fail with InvalidServiceLevel.
        #[test]
        fn invalid_service_level_always_fails(
            level in prop_oneof![-5.0f64..=0.0, 1.0f64..5.0],
            on_hand in 0.0f64..1_000.0,
        ) {
            let forecast = flat_forecast("SKU-1", 10.0, &[2.0; 4]);
            let result = ReorderEngine::new(2, 1, level)
                .recommend(&StockPosition::new(item("SKU-1"), on_hand), &forecast);
            prop_assert_eq!(result, Err(EngineError::InvalidServiceLevel(level)));
        }

        /// Property: the recommended quantity is never negative.
        #[test]
        fn quantity_is_never_negative(
            point in 0.0f64..100.0,
            variance in 0.0f64..50.0,
            on_hand in 0.0f64..5_000.0,
            level in 0.01f64..0.99,
        ) {
            let forecast = flat_forecast("SKU-1", point, &[variance; 6]);
            let rec = ReorderEngine::new(3, 2, level)
                .recommend(&StockPosition::new(item("SKU-1"), on_hand), &forecast)
                .unwrap();
            prop_assert!(rec.recommended_quantity >= 0.0);
            prop_assert!(rec.safety_stock >= 0.0);
        }
    }
}
