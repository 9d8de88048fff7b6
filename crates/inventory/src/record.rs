use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockpilot_core::{EngineResult, ItemId, ValueObject, ensure_quantity};

/// One historical usage observation for an item.
///
/// Produced by ingestion after type validation; the engine never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub item_id: ItemId,
    pub timestamp: DateTime<Utc>,
    pub quantity_used: f64,
    pub quantity_on_hand_snapshot: f64,
}

impl ValueObject for UsageRecord {}

impl UsageRecord {
    /// Build a record, rejecting negative or non-finite quantities.
    pub fn new(
        item_id: ItemId,
        timestamp: DateTime<Utc>,
        quantity_used: f64,
        quantity_on_hand_snapshot: f64,
    ) -> EngineResult<Self> {
        let record = Self {
            item_id,
            timestamp,
            quantity_used,
            quantity_on_hand_snapshot,
        };
        record.validate()?;
        Ok(record)
    }

    /// Boundary check repeated by the series builder for records that
    /// arrived through deserialization instead of [`UsageRecord::new`].
    pub fn validate(&self) -> EngineResult<()> {
        ensure_quantity("quantity_used", self.quantity_used)?;
        ensure_quantity("quantity_on_hand_snapshot", self.quantity_on_hand_snapshot)
    }
}

/// Lifecycle status of an item. Only active items are replenished.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Active,
    /// Discontinued or otherwise excluded from replenishment.
    Inactive,
}

/// On-hand snapshot of the most recent record, if any.
///
/// Records may arrive unsorted; ties on timestamp resolve to the later record in input order.
pub fn latest_on_hand(records: &[UsageRecord]) -> Option<f64> {
    records
        .iter()
        .max_by_key(|r| r.timestamp)
        .map(|r| r.quantity_on_hand_snapshot)
}
