//! `stockpilot-core`: shared building blocks of the planning engine.
//!
//! This crate contains **pure** primitives (no I/O): identifiers, the error
//! taxonomy and the configuration surface consumed by every stage.

pub mod config;
pub mod error;
pub mod id;
pub mod value_object;

pub use config::{
    EngineConfig, Frequency, GapFillPolicy, ModelKind, SmoothingParams, validate_service_level,
};
pub use error::{EngineError, EngineResult, ensure_quantity};
pub use id::{ItemId, RunId};
pub use value_object::ValueObject;
