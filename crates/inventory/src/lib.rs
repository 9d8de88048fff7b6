//! Inventory usage history.
//!
//! Typed usage records and the Series Builder that turns them into regular,
//! gap-filled per-item series. Deterministic transforms only (no IO).

pub mod period;
pub mod record;
pub mod series;

pub use period::Period;
pub use record::{ItemStatus, UsageRecord, latest_on_hand};
pub use series::{ItemSeries, SeriesBuilder, SeriesPoint};
