//! Per-item planning pipeline.
//!
//! Series Builder → Forecast Model → Inventory State Evaluator + Reorder Engine.
//! Each item's plan is a pure function of its own records and the shared,
//! immutable configuration.

use serde::{Deserialize, Serialize};
use tracing::debug;

use stockpilot_core::{EngineConfig, EngineError, EngineResult, ItemId};
use stockpilot_forecast::{
    AccuracyReport, ForecastModel, ForecastResult, TrendReport, backtest, detect_trend, model_for,
};
use stockpilot_inventory::{ItemStatus, SeriesBuilder, UsageRecord, latest_on_hand};
use stockpilot_replenishment::{
    InventoryState, ReorderEngine, ReorderRecommendation, StockEvaluator, StockPosition,
};

/// Everything the engine needs to plan one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInput {
    pub item_id: ItemId,
    pub records: Vec<UsageRecord>,
    #[serde(default)]
    pub status: ItemStatus,
}

impl ItemInput {
    pub fn new(item_id: ItemId, records: Vec<UsageRecord>) -> Self {
        Self {
            item_id,
            records,
            status: ItemStatus::Active,
        }
    }

    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }
}

/// Outcome of planning one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPlan {
    pub item_id: ItemId,
    pub series_periods: usize,
    pub filled_periods: usize,
    pub forecast: ForecastResult,
    pub state: InventoryState,
    pub recommendation: ReorderRecommendation,
    pub trend: TrendReport,
    /// Absent when the series is too short to hold any periods out.
    pub accuracy: Option<AccuracyReport>,
}

pub struct Planner {
    config: EngineConfig,
    builder: SeriesBuilder,
    model: Box<dyn ForecastModel>,
    evaluator: StockEvaluator,
    reorder: ReorderEngine,
}

impl core::fmt::Debug for Planner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Planner")
            .field("config", &self.config)
            .field("model", &self.model.name())
            .finish()
    }
}

impl Planner {
    /// Validate `config` once and wire up every stage from it.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            builder: SeriesBuilder::from_config(&config),
            model: model_for(&config),
            evaluator: StockEvaluator::from_config(&config),
            reorder: ReorderEngine::from_config(&config),
            config,
        })
    }

    /// Substitute the forecasting strategy; the other stages are unaffected.
    pub fn with_model(mut self, model: Box<dyn ForecastModel>) -> Self {
        self.model = model;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    pub fn plan_item(&self, input: &ItemInput) -> EngineResult<ItemPlan> {
        let item_id = &input.item_id;

        let series = self.builder.build(item_id, &input.records)?;
        let forecast = self
            .model
            .fit_and_forecast(&series, self.config.forecast_horizon)?;

        let on_hand = latest_on_hand(&input.records)
            .ok_or_else(|| EngineError::insufficient_data(item_id, self.builder.min_periods(), 0))?;
        let position = StockPosition::new(item_id.clone(), on_hand).with_status(input.status);

        let state = self.evaluator.evaluate_with(&position, &forecast)?;
        let recommendation = self.reorder.recommend(&position, &forecast)?;

        let trend = detect_trend(&series, self.config.trend_window);
        let accuracy = match backtest(self.model.as_ref(), &series, self.config.holdout_fraction) {
            Ok(report) => Some(report),
            Err(e) => {
                debug!(item = %item_id, error = %e, "skipping holdout accuracy");
                None
            }
        };

        Ok(ItemPlan {
            item_id: item_id.clone(),
            series_periods: series.len(),
            filled_periods: series.filled_count(),
            forecast,
            state,
            recommendation,
            trend,
            accuracy,
        })
    }
}
