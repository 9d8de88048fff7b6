//! Period alignment for the supported sampling frequencies.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockpilot_core::{EngineError, EngineResult, Frequency, ValueObject};

/// Start date of a sampling period (a day, an ISO week starting Monday, or a calendar month).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(NaiveDate);

impl ValueObject for Period {}

impl Period {
    /// The period of `frequency` that contains `date`.
    ///
    /// Fails when the period would start before the first representable date.
    pub fn containing(date: NaiveDate, frequency: Frequency) -> EngineResult<Self> {
        let offset = match frequency {
            Frequency::Daily => 0,
            Frequency::Weekly => date.weekday().num_days_from_monday(),
            Frequency::Monthly => date.day0(),
        };
        date.checked_sub_days(Days::new(offset as u64))
            .map(Self)
            .ok_or_else(|| EngineError::invalid_input(format!("no {frequency:?} period contains {date}")))
    }

    pub fn of_timestamp(ts: DateTime<Utc>, frequency: Frequency) -> EngineResult<Self> {
        Self::containing(ts.date_naive(), frequency)
    }

    /// True when this period starts on a `frequency` boundary.
    pub fn is_aligned(&self, frequency: Frequency) -> bool {
        Self::containing(self.0, frequency).is_ok_and(|p| p == *self)
    }

    pub fn start(&self) -> NaiveDate {
        self.0
    }

    /// The following period; fails only at the end of the calendar range.
    pub fn next(&self, frequency: Frequency) -> EngineResult<Self> {
        self.advance(frequency, 1)
    }

    /// The period `steps` periods later.
    pub fn advance(&self, frequency: Frequency, steps: u32) -> EngineResult<Self> {
        let next = match frequency {
            Frequency::Daily => self.0.checked_add_days(Days::new(steps as u64)),
            Frequency::Weekly => self.0.checked_add_days(Days::new(7 * steps as u64)),
            Frequency::Monthly => self.0.checked_add_months(Months::new(steps)),
        };
        next.map(Self)
            .ok_or_else(|| EngineError::invalid_input(format!("period overflow after {}", self.0)))
    }
}

impl core::fmt::Display for Period {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekly_periods_start_on_monday() {
        // 2024-03-14 is a Thursday.
        let p = Period::containing(date(2024, 3, 14), Frequency::Weekly).unwrap();
        assert_eq!(p.start(), date(2024, 3, 11));
        assert_eq!(Period::containing(date(2024, 3, 11), Frequency::Weekly).unwrap(), p);
        assert_eq!(Period::containing(date(2024, 3, 17), Frequency::Weekly).unwrap(), p);
    }

    #[test]
    fn monthly_periods_start_on_the_first() {
        let p = Period::containing(date(2024, 2, 29), Frequency::Monthly).unwrap();
        assert_eq!(p.start(), date(2024, 2, 1));
        assert_eq!(p.next(Frequency::Monthly).unwrap().start(), date(2024, 3, 1));
    }

    #[test]
    fn advance_steps_by_frequency() {
        let p = Period::containing(date(2024, 12, 30), Frequency::Daily).unwrap();
        assert_eq!(p.advance(Frequency::Daily, 3).unwrap().start(), date(2025, 1, 2));

        let w = Period::containing(date(2024, 12, 30), Frequency::Weekly).unwrap();
        assert_eq!(w.advance(Frequency::Weekly, 2).unwrap().start(), date(2025, 1, 13));
    }

    #[test]
    fn overflow_is_an_input_error() {
        let p = Period::containing(NaiveDate::MAX, Frequency::Daily).unwrap();
        assert!(matches!(p.next(Frequency::Daily), Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn week_before_the_first_date_is_an_input_error() {
        let earliest = DateTime::<Utc>::MIN_UTC;
        assert!(matches!(
            Period::of_timestamp(earliest, Frequency::Weekly),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(Period::of_timestamp(earliest, Frequency::Daily).is_ok());
    }

    #[test]
    fn alignment_follows_frequency() {
        let monday = Period::containing(date(2024, 3, 11), Frequency::Daily).unwrap();
        let wednesday = Period::containing(date(2024, 3, 13), Frequency::Daily).unwrap();
        assert!(monday.is_aligned(Frequency::Weekly));
        assert!(!wednesday.is_aligned(Frequency::Weekly));
        assert!(!monday.is_aligned(Frequency::Monthly));
    }
}
