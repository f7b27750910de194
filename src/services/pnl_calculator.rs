use crate::domain::{PnLResult, ValueSnapshot};
use crate::error::{PnlError, Result};
use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;

pub struct PnLCalculator;

impl PnLCalculator {
    /// Deltas of `current_value` against the ledger as of `as_of`.
    ///
    /// - today: against the last appended entry, however old it is
    /// - weekly: against the entry dated exactly `as_of - 7 days`
    /// - monthly: against the entry dated the last day of the previous month
    ///
    /// A missing reference entry gives a zero delta, as does a reference date
    /// before the start of the calendar. When several entries share the
    /// reference date, the latest appended one wins.
    pub fn compute_pnl(
        history: &[ValueSnapshot],
        current_value: Decimal,
        as_of: NaiveDate,
    ) -> Result<PnLResult> {
        let Some(last) = history.last() else {
            return Ok(PnLResult::default());
        };

        let today = Self::delta(current_value, Some(last))?;
        let weekly = Self::delta(
            current_value,
            Self::find_on(history, Self::one_week_before(as_of)),
        )?;
        let monthly = Self::delta(
            current_value,
            Self::find_on(history, Self::previous_month_end(as_of)),
        )?;

        Ok(PnLResult {
            today,
            weekly,
            monthly,
        })
    }

    /// `None` when `as_of` is within a week of [`NaiveDate::MIN`].
    pub fn one_week_before(as_of: NaiveDate) -> Option<NaiveDate> {
        as_of.checked_sub_days(Days::new(7))
    }

    /// Last calendar day of the month before `as_of`.
    pub fn previous_month_end(as_of: NaiveDate) -> Option<NaiveDate> {
        as_of.with_day(1).and_then(|first| first.pred_opt())
    }

    fn find_on(history: &[ValueSnapshot], date: Option<NaiveDate>) -> Option<&ValueSnapshot> {
        let date = date?;
        history.iter().rev().find(|entry| entry.date == date)
    }

    fn delta(current_value: Decimal, reference: Option<&ValueSnapshot>) -> Result<Decimal> {
        match reference {
            Some(entry) => current_value
                .checked_sub(entry.value)
                .ok_or_else(|| PnlError::Calculation("PnL difference overflow".to_string())),
            None => Ok(Decimal::ZERO),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(d: NaiveDate, value: Decimal) -> ValueSnapshot {
        ValueSnapshot::new(d, value)
    }

    #[test]
    fn test_empty_history_is_all_zero() {
        for value in [dec!(0), dec!(31000), dec!(-5)] {
            let pnl = PnLCalculator::compute_pnl(&[], value, date(2024, 3, 15)).unwrap();
            assert_eq!(pnl, PnLResult::default());
        }
    }

    #[test]
    fn test_today_uses_last_appended_entry() {
        // Out of date order on purpose: the last row wins, not the latest date
        let history = vec![
            entry(date(2024, 3, 14), dec!(30000)),
            entry(date(2024, 3, 1), dec!(28000)),
        ];

        let pnl = PnLCalculator::compute_pnl(&history, dec!(31000), date(2024, 3, 15)).unwrap();

        assert_eq!(pnl.today, dec!(3000));
    }

    #[test]
    fn test_today_with_stale_last_entry() {
        let history = vec![entry(date(2023, 12, 1), dec!(20000))];
        let pnl = PnLCalculator::compute_pnl(&history, dec!(25000), date(2024, 3, 15)).unwrap();

        assert_eq!(pnl.today, dec!(5000));
        assert_eq!(pnl.weekly, Decimal::ZERO);
        assert_eq!(pnl.monthly, Decimal::ZERO);
    }

    #[test]
    fn test_weekly_exact_date_only() {
        let as_of = date(2024, 3, 15);
        let history = vec![
            entry(date(2024, 3, 8), dec!(29000)),
            entry(date(2024, 3, 14), dec!(30500)),
        ];

        let pnl = PnLCalculator::compute_pnl(&history, dec!(31000), as_of).unwrap();
        assert_eq!(pnl.weekly, dec!(2000));

        // 9 March is one day off the anniversary: no weekly figure
        let history = vec![
            entry(date(2024, 3, 9), dec!(29000)),
            entry(date(2024, 3, 14), dec!(30500)),
        ];
        let pnl = PnLCalculator::compute_pnl(&history, dec!(31000), as_of).unwrap();
        assert_eq!(pnl.weekly, Decimal::ZERO);
    }

    #[test]
    fn test_monthly_uses_previous_month_end() {
        let history = vec![
            entry(date(2024, 2, 28), dec!(1000)),
            entry(date(2024, 2, 29), dec!(1200)),
            entry(date(2024, 3, 14), dec!(1400)),
        ];

        let pnl = PnLCalculator::compute_pnl(&history, dec!(1500), date(2024, 3, 15)).unwrap();

        assert_eq!(pnl.monthly, dec!(300));
        assert_eq!(pnl.today, dec!(100));
    }

    #[test]
    fn test_duplicate_reference_date_takes_latest_row() {
        let history = vec![
            entry(date(2024, 3, 8), dec!(100)),
            entry(date(2024, 3, 8), dec!(150)),
        ];

        let pnl = PnLCalculator::compute_pnl(&history, dec!(200), date(2024, 3, 15)).unwrap();

        assert_eq!(pnl.weekly, dec!(50));
    }

    #[test]
    fn test_negative_deltas() {
        let history = vec![entry(date(2024, 3, 14), dec!(32000))];
        let pnl = PnLCalculator::compute_pnl(&history, dec!(31000), date(2024, 3, 15)).unwrap();
        assert_eq!(pnl.today, dec!(-1000));
    }

    #[test]
    fn test_reference_dates() {
        assert_eq!(
            PnLCalculator::previous_month_end(date(2024, 3, 15)),
            Some(date(2024, 2, 29))
        );
        assert_eq!(
            PnLCalculator::previous_month_end(date(2024, 1, 1)),
            Some(date(2023, 12, 31))
        );
        assert_eq!(
            PnLCalculator::previous_month_end(date(2024, 5, 31)),
            Some(date(2024, 4, 30))
        );
        assert_eq!(
            PnLCalculator::one_week_before(date(2024, 3, 3)),
            Some(date(2024, 2, 25))
        );
    }

    #[test]
    fn test_reference_dates_before_calendar_start() {
        let as_of = NaiveDate::MIN.checked_add_days(Days::new(3)).unwrap();
        assert_eq!(PnLCalculator::one_week_before(as_of), None);
        assert_eq!(PnLCalculator::previous_month_end(as_of), None);

        let history = vec![entry(NaiveDate::MIN, dec!(100))];
        let pnl = PnLCalculator::compute_pnl(&history, dec!(150), as_of).unwrap();
        assert_eq!(pnl.today, dec!(50));
        assert_eq!(pnl.weekly, Decimal::ZERO);
        assert_eq!(pnl.monthly, Decimal::ZERO);
    }
}
