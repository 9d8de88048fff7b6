//! Replenishment decisions.
//!
//! Turns a [`stockpilot_forecast::ForecastResult`] plus the current stock position
//! into a stock-health label and a reorder recommendation. Both stages read the
//! forecast and never mutate it or the on-hand snapshot.

pub mod evaluator;
pub mod levels;
pub mod reorder;

pub use evaluator::{InventoryState, StockEvaluator, StockHealth, classify};
pub use levels::{ForecastBook, ReplenishmentLevels, StockPosition};
pub use reorder::{ReorderEngine, ReorderRecommendation, TriggerReason};
