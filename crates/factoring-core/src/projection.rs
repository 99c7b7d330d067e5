//! Daily projection: forecast of day-by-day compounding of compensatory
//! and moratory interest over a fixed horizon. Pure computation; nothing
//! persisted is touched.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::interest::{apply_igv, DAYS_IN_MONTH};
use crate::types::{Money, Rate};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionInput {
    pub initial_capital: Money,
    pub start_date: NaiveDate,
    pub monthly_compensatory_rate: Rate,
    pub monthly_moratory_rate: Rate,
    pub horizon_days: u32,
}

/// One projected day. Interest capitalizes daily: `capital_after` carries
/// all four accrual components into the next day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    /// 1-based day number within the horizon.
    pub day: u32,
    pub capital_before: Money,
    pub compensatory_interest: Money,
    pub compensatory_igv: Money,
    pub moratory_interest: Money,
    pub moratory_igv: Money,
    pub capital_after: Money,
}

/// Lazy, restartable projection sequence. Clone to restart from the
/// original state; the iterator is finite (`horizon_days` records).
#[derive(Debug, Clone)]
pub struct DailyProjection {
    capital: Money,
    date: NaiveDate,
    daily_compensatory: Rate,
    daily_moratory: Rate,
    day: u32,
    horizon_days: u32,
}

impl DailyProjection {
    pub fn new(input: &ProjectionInput) -> Self {
        DailyProjection {
            capital: input.initial_capital,
            date: input.start_date,
            daily_compensatory: input.monthly_compensatory_rate / DAYS_IN_MONTH,
            daily_moratory: input.monthly_moratory_rate / DAYS_IN_MONTH,
            day: 0,
            horizon_days: input.horizon_days,
        }
    }
}

impl Iterator for DailyProjection {
    type Item = DayRecord;

    fn next(&mut self) -> Option<DayRecord> {
        if self.day >= self.horizon_days {
            return None;
        }
        self.day += 1;

        let capital_before = self.capital;
        let compensatory_interest = capital_before * self.daily_compensatory;
        let compensatory_igv = apply_igv(compensatory_interest);
        let moratory_interest = capital_before * self.daily_moratory;
        let moratory_igv = apply_igv(moratory_interest);

        let capital_after = capital_before
            + compensatory_interest
            + compensatory_igv
            + moratory_interest
            + moratory_igv;

        let record = DayRecord {
            date: self.date,
            day: self.day,
            capital_before,
            compensatory_interest,
            compensatory_igv,
            moratory_interest,
            moratory_igv,
            capital_after,
        };

        self.capital = capital_after;
        match self.date.checked_add_days(Days::new(1)) {
            Some(next) => self.date = next,
            // Calendar exhausted: stop after this record.
            None => self.day = self.horizon_days,
        }

        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.horizon_days - self.day) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DailyProjection {}

/// Collect the whole horizon into a forecast table, ordered by date.
pub fn project_daily(input: &ProjectionInput) -> Vec<DayRecord> {
    DailyProjection::new(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input() -> ProjectionInput {
        ProjectionInput {
            initial_capital: dec!(1000),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            monthly_compensatory_rate: dec!(0.02),
            monthly_moratory_rate: dec!(0.03),
            horizon_days: 30,
        }
    }

    #[test]
    fn test_single_step_closed_form() {
        let records = project_daily(&input());
        let first = &records[0];

        let comp = dec!(1000) * dec!(0.02) / dec!(30);
        let mora = dec!(1000) * dec!(0.03) / dec!(30);
        let expected_after =
            dec!(1000) + comp + comp * dec!(0.18) + mora + mora * dec!(0.18);

        assert_eq!(first.capital_before, dec!(1000));
        assert_eq!(first.compensatory_interest, comp);
        assert_eq!(first.moratory_interest, mora);
        assert_eq!(first.capital_after, expected_after);
    }

    #[test]
    fn test_horizon_length_and_ordering() {
        let records = project_daily(&input());
        assert_eq!(records.len(), 30);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(records[29].date, NaiveDate::from_ymd_opt(2025, 1, 30).unwrap());
        for pair in records.windows(2) {
            assert!(pair[1].date > pair[0].date);
            assert_eq!(pair[1].capital_before, pair[0].capital_after);
        }
    }

    #[test]
    fn test_capital_compounds_daily() {
        let records = project_daily(&input());
        // Growing balance means growing daily interest.
        assert!(records[29].compensatory_interest > records[0].compensatory_interest);
    }

    #[test]
    fn test_clone_restarts_sequence() {
        let projection = DailyProjection::new(&input());
        let restart = projection.clone();
        let first_run: Vec<_> = projection.collect();
        let second_run: Vec<_> = restart.collect();
        assert_eq!(first_run.len(), second_run.len());
        assert_eq!(first_run[0].capital_after, second_run[0].capital_after);
    }

    #[test]
    fn test_zero_horizon_is_empty() {
        let mut zero = input();
        zero.horizon_days = 0;
        assert!(project_daily(&zero).is_empty());
    }
}
