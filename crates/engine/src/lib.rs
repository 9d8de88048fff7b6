//! Planning pipeline for inventory forecasting and reorder decisions.
//!
//! [`Planner`] runs one item through series building, forecasting, state
//! evaluation and reorder recommendation. [`BatchPlanner`] fans a batch out
//! over a bounded worker pool and gathers a [`PlanningReport`].
//!
//! ```no_run
//! use stockpilot_core::EngineConfig;
//! use stockpilot_engine::BatchPlanner;
//!
//! let config = EngineConfig::from_env();
//! let planner = BatchPlanner::new(config)?;
//! let report = planner.plan(&[], None);
//! println!("{}", report.to_json()?);
//! # Ok::<(), stockpilot_core::EngineError>(())
//! ```

pub mod batch;
pub mod planner;
pub mod report;

pub use batch::BatchPlanner;
pub use planner::{ItemInput, ItemPlan, Planner};
pub use report::{ItemFailure, PlanningReport, TurnoverSummary};
