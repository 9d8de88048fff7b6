//! Engine error model.

use thiserror::Error;

use crate::id::ItemId;

/// Result type used across the planning engine.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-level error.
///
/// Every failure is scoped to a single item (or to the configuration); the
/// batch planner collects them per item instead of aborting the run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// The usage history is too short to build or forecast a series.
    #[error("insufficient data for item {item_id}: {actual} period(s), need at least {required}")]
    InsufficientData {
        item_id: ItemId,
        required: usize,
        actual: usize,
    },

    /// The target service level is outside the open interval (0, 1).
    #[error("invalid service level {0}: must lie strictly between 0 and 1")]
    InvalidServiceLevel(f64),

    /// The evaluator or reorder engine ran without a usable forecast.
    #[error("missing forecast for item {item_id}: {reason}")]
    MissingForecast { item_id: ItemId, reason: String },

    /// Negative or malformed quantities reached the engine boundary.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A configuration value other than the service level is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The batch deadline passed before the item was planned.
    #[error("deadline exceeded before item {item_id} was planned")]
    DeadlineExceeded { item_id: ItemId },
}

impl EngineError {
    pub fn insufficient_data(item_id: &ItemId, required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            item_id: item_id.clone(),
            required,
            actual,
        }
    }

    pub fn missing_forecast(item_id: &ItemId, reason: impl Into<String>) -> Self {
        Self::MissingForecast {
            item_id: item_id.clone(),
            reason: reason.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Stable machine-readable tag for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InsufficientData { .. } => "insufficient_data",
            EngineError::InvalidServiceLevel(_) => "invalid_service_level",
            EngineError::MissingForecast { .. } => "missing_forecast",
            EngineError::InvalidInput(_) => "invalid_input",
            EngineError::InvalidConfig(_) => "invalid_config",
            EngineError::DeadlineExceeded { .. } => "deadline_exceeded",
        }
    }
}

/// Reject quantities that are negative, NaN or infinite.
pub fn ensure_quantity(field: &str, value: f64) -> EngineResult<()> {
    if !value.is_finite() {
        return Err(EngineError::invalid_input(format!("{field} must be finite (got {value})")));
    }
    if value < 0.0 {
        return Err(EngineError::invalid_input(format!("{field} cannot be negative (got {value})")));
    }
    Ok(())
}
