//! Strongly-typed identifiers used across the engine.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

/// Identifier of a stock-keeping item (single location, single SKU).
///
/// Always non-empty and trimmed; use `FromStr` / `TryFrom<String>` to build one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ItemId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(EngineError::invalid_input("item_id cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl TryFrom<String> for ItemId {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ItemId> for String {
    fn from(value: ItemId) -> Self {
        value.0
    }
}

/// Identifier of one batch planning run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered) so runs sort by start time.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RunId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RunId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid =
            Uuid::from_str(s).map_err(|e| EngineError::invalid_input(format!("RunId: {e}")))?;
        Ok(Self(uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_is_trimmed() {
        let id: ItemId = "  SKU-42 ".parse().unwrap();
        assert_eq!(id.as_str(), "SKU-42");
        assert_eq!(id.to_string(), "SKU-42");
    }

    #[test]
    fn blank_item_id_is_rejected() {
        assert!(matches!("   ".parse::<ItemId>(), Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn item_id_serializes_as_plain_string() {
        let id: ItemId = "SKU-1".parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"SKU-1\"");
        let back: ItemId = serde_json::from_str("\"SKU-1\"").unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<ItemId>("\"\"").is_err());
    }

    #[test]
    fn run_id_round_trips_through_display() {
        let id = RunId::new();
        let parsed: RunId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
