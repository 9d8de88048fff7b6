//! Series Builder: cleaned usage records → regular time-indexed usage series.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use stockpilot_core::{
    EngineConfig, EngineError, EngineResult, Frequency, GapFillPolicy, ItemId, ValueObject,
    ensure_quantity,
};

use crate::period::Period;
use crate::record::UsageRecord;

/// One period of an item series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub period: Period,
    pub quantity_used: f64,
    /// True when no record fell in this period and the value came from the gap-fill policy.
    pub filled: bool,
}

impl ValueObject for SeriesPoint {}

/// Regular usage series for one item.
///
/// Invariant: periods are aligned to `frequency`, consecutive, strictly increasing and
/// without duplicates; quantities are finite and non-negative. The fields are private and
/// deserialization re-checks everything, so the builder, [`ItemSeries::from_values`] and
/// serde are the only ways in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawItemSeries")]
pub struct ItemSeries {
    item_id: ItemId,
    frequency: Frequency,
    points: Vec<SeriesPoint>,
}

#[derive(Deserialize)]
struct RawItemSeries {
    item_id: ItemId,
    frequency: Frequency,
    points: Vec<SeriesPoint>,
}

impl TryFrom<RawItemSeries> for ItemSeries {
    type Error = EngineError;

    fn try_from(raw: RawItemSeries) -> EngineResult<Self> {
        let mut previous: Option<Period> = None;
        for point in &raw.points {
            ensure_quantity("quantity_used", point.quantity_used)?;
            if !point.period.is_aligned(raw.frequency) {
                return Err(EngineError::invalid_input(format!(
                    "period {} of item {} is not a {:?} boundary",
                    point.period, raw.item_id, raw.frequency
                )));
            }
            if let Some(prev) = previous {
                if prev.next(raw.frequency)? != point.period {
                    return Err(EngineError::invalid_input(format!(
                        "period {} of item {} does not follow {prev}",
                        point.period, raw.item_id
                    )));
                }
            }
            previous = Some(point.period);
        }
        Ok(Self {
            item_id: raw.item_id,
            frequency: raw.frequency,
            points: raw.points,
        })
    }
}

impl ItemSeries {
    /// Build a dense series of `values` starting at the period containing `start`.
    pub fn from_values(
        item_id: ItemId,
        frequency: Frequency,
        start: NaiveDate,
        values: &[f64],
    ) -> EngineResult<Self> {
        let mut period = Period::containing(start, frequency)?;
        let mut points = Vec::with_capacity(values.len());
        for (i, &v) in values.iter().enumerate() {
            ensure_quantity("quantity_used", v)?;
            if i > 0 {
                period = period.next(frequency)?;
            }
            points.push(SeriesPoint {
                period,
                quantity_used: v,
                filled: false,
            });
        }
        Ok(Self {
            item_id,
            frequency,
            points,
        })
    }

    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.quantity_used).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_period(&self) -> Option<Period> {
        self.points.first().map(|p| p.period)
    }

    pub fn last_period(&self) -> Option<Period> {
        self.points.last().map(|p| p.period)
    }

    pub fn is_all_zero(&self) -> bool {
        self.points.iter().all(|p| p.quantity_used == 0.0)
    }

    /// Number of periods whose value came from gap filling.
    pub fn filled_count(&self) -> usize {
        self.points.iter().filter(|p| p.filled).count()
    }

    pub fn mean(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        self.points.iter().map(|p| p.quantity_used).sum::<f64>() / self.points.len() as f64
    }
}

/// Pure transform from per-item usage records to an [`ItemSeries`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SeriesBuilder {
    frequency: Frequency,
    gap_fill: GapFillPolicy,
    min_periods: usize,
}

impl SeriesBuilder {
    pub fn new(frequency: Frequency, gap_fill: GapFillPolicy, min_periods: usize) -> Self {
        Self {
            frequency,
            gap_fill,
            min_periods,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.frequency, config.gap_fill_policy, config.min_periods())
    }

    pub fn min_periods(&self) -> usize {
        self.min_periods
    }

    /// Bucket `records` by period and fill the span from the first to the last observed period.
    pub fn build(&self, item_id: &ItemId, records: &[UsageRecord]) -> EngineResult<ItemSeries> {
        if records.is_empty() {
            return Err(EngineError::insufficient_data(item_id, self.min_periods, 0));
        }

        let mut buckets: BTreeMap<Period, f64> = BTreeMap::new();
        for record in records {
            if &record.item_id != item_id {
                return Err(EngineError::invalid_input(format!(
                    "record for item {} passed to series of item {item_id}",
                    record.item_id
                )));
            }
            record.validate()?;
            *buckets
                .entry(Period::of_timestamp(record.timestamp, self.frequency)?)
                .or_insert(0.0) += record.quantity_used;
        }
        if let Some((period, _)) = buckets.iter().find(|(_, total)| !total.is_finite()) {
            return Err(EngineError::invalid_input(format!(
                "usage of item {item_id} in period {period} overflows"
            )));
        }

        // Non-empty: at least one record was bucketed above.
        let (Some((&first, _)), Some((&last, _))) =
            (buckets.first_key_value(), buckets.last_key_value())
        else {
            return Err(EngineError::insufficient_data(item_id, self.min_periods, 0));
        };

        let mut observed: Vec<(Period, Option<f64>)> = Vec::new();
        let mut period = first;
        loop {
            observed.push((period, buckets.get(&period).copied()));
            if period >= last {
                break;
            }
            period = period.next(self.frequency)?;
        }

        if observed.len() < self.min_periods {
            return Err(EngineError::insufficient_data(
                item_id,
                self.min_periods,
                observed.len(),
            ));
        }

        let values = fill_gaps(&observed, self.gap_fill);
        let points: Vec<SeriesPoint> = observed
            .iter()
            .zip(values)
            .map(|(&(period, obs), quantity_used)| SeriesPoint {
                period,
                quantity_used,
                filled: obs.is_none(),
            })
            .collect();

        debug!(
            item = %item_id,
            records = records.len(),
            periods = points.len(),
            filled = points.iter().filter(|p| p.filled).count(),
            "built usage series"
        );

        Ok(ItemSeries {
            item_id: item_id.clone(),
            frequency: self.frequency,
            points,
        })
    }
}

/// Resolve missing periods. The first and last entries are always observed.
fn fill_gaps(observed: &[(Period, Option<f64>)], policy: GapFillPolicy) -> Vec<f64> {
    let mut out = Vec::with_capacity(observed.len());
    match policy {
        GapFillPolicy::ZeroFill => {
            out.extend(observed.iter().map(|(_, v)| v.unwrap_or(0.0)));
        }
        GapFillPolicy::ForwardFill => {
            let mut prev = 0.0;
            for (_, v) in observed {
                let value = v.unwrap_or(prev);
                out.push(value);
                prev = value;
            }
        }
        GapFillPolicy::Interpolate => {
            let mut last_seen: Option<(usize, f64)> = None;
            for (i, (_, v)) in observed.iter().enumerate() {
                match v {
                    Some(value) => {
                        if let Some((j, prev)) = last_seen {
                            let span = (i - j) as f64;
                            for k in (j + 1)..i {
                                let t = (k - j) as f64 / span;
                                out[k] = prev + (value - prev) * t;
                            }
                        }
                        out.push(*value);
                        last_seen = Some((i, *value));
                    }
                    None => out.push(0.0),
                }
            }
        }
    }
    out
}
