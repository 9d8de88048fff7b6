//! Aggregated outcome of a planning run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use stockpilot_core::{EngineConfig, EngineError, EngineResult, ItemId, RunId};
use stockpilot_forecast::stats::{mean, median, stddev_sample};
use stockpilot_forecast::{AccuracyReport, TrendReport};
use stockpilot_replenishment::{
    ForecastBook, InventoryState, ReorderRecommendation, StockHealth,
};

use crate::planner::ItemPlan;

/// Why an item has no plan in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFailure {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip)]
    pub error: EngineError,
}

impl From<EngineError> for ItemFailure {
    fn from(error: EngineError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            error,
        }
    }
}

/// Spread of stock turnover across the planned items that hold stock.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct TurnoverSummary {
    pub items: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
}

/// Per-item results keyed by item, plus the failures of items that could not
/// be planned. Every input item appears either in the result maps or in
/// `failures`, never both.
#[derive(Debug, Clone, Serialize)]
pub struct PlanningReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config: EngineConfig,
    pub forecasts: ForecastBook,
    pub states: BTreeMap<ItemId, InventoryState>,
    pub recommendations: BTreeMap<ItemId, ReorderRecommendation>,
    pub trends: BTreeMap<ItemId, TrendReport>,
    pub accuracy: BTreeMap<ItemId, AccuracyReport>,
    pub failures: BTreeMap<ItemId, ItemFailure>,
}

impl PlanningReport {
    pub(crate) fn begin(config: EngineConfig) -> Self {
        let now = Utc::now();
        Self {
            run_id: RunId::new(),
            started_at: now,
            finished_at: now,
            config,
            forecasts: BTreeMap::new(),
            states: BTreeMap::new(),
            recommendations: BTreeMap::new(),
            trends: BTreeMap::new(),
            accuracy: BTreeMap::new(),
            failures: BTreeMap::new(),
        }
    }

    pub(crate) fn record_plan(&mut self, plan: ItemPlan) {
        let id = plan.item_id;
        if let Some(accuracy) = plan.accuracy {
            self.accuracy.insert(id.clone(), accuracy);
        }
        self.trends.insert(id.clone(), plan.trend);
        self.states.insert(id.clone(), plan.state);
        self.recommendations.insert(id.clone(), plan.recommendation);
        self.forecasts.insert(id, plan.forecast);
    }

    pub(crate) fn record_failure(&mut self, item_id: ItemId, error: EngineError) {
        self.failures.insert(item_id, error.into());
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    pub fn success_count(&self) -> usize {
        self.forecasts.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn error_for(&self, item_id: &ItemId) -> Option<&EngineError> {
        self.failures.get(item_id).map(|f| &f.error)
    }

    /// Recommendations that actually ask for stock, largest first.
    pub fn orders(&self) -> Vec<&ReorderRecommendation> {
        let mut orders: Vec<_> = self
            .recommendations
            .values()
            .filter(|r| r.recommended_quantity > 0.0)
            .collect();
        orders.sort_by(|a, b| {
            b.recommended_quantity
                .total_cmp(&a.recommended_quantity)
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        orders
    }

    pub fn items_in(&self, health: StockHealth) -> Vec<&ItemId> {
        self.states
            .values()
            .filter(|s| s.classification == health)
            .map(|s| &s.item_id)
            .collect()
    }

    /// `None` when no planned item has stock on hand.
    pub fn turnover_summary(&self) -> Option<TurnoverSummary> {
        let rates: Vec<f64> = self.states.values().filter_map(|s| s.turnover).collect();
        let median = median(&rates)?;
        let mean = mean(&rates);
        Some(TurnoverSummary {
            items: rates.len(),
            mean,
            median,
            std: stddev_sample(&rates, mean),
        })
    }

    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EngineError::invalid_input(format!("report serialization failed: {e}")))
    }
}
