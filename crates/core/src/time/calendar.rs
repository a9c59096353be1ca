use crate::domain::query::{Preset, TimeRangeSpec};
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;

const DEFAULT_TRAILING_DAYS: u64 = 30;

/// Half-open date interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// Resolves an abstract time range against an explicit `today`.
///
/// `end` is exclusive and, except for `last_month` and custom ranges, is `today + 1` so the
/// current day is always included. Anything that cannot be resolved falls back to the
/// trailing 30 days.
pub fn resolve_window(spec: Option<&TimeRangeSpec>, today: NaiveDate) -> DateWindow {
    spec.and_then(|spec| try_resolve(spec, today))
        .unwrap_or_else(|| trailing_days(today, DEFAULT_TRAILING_DAYS).unwrap_or(DateWindow {
            start: today,
            end: today,
        }))
}

fn try_resolve(spec: &TimeRangeSpec, today: NaiveDate) -> Option<DateWindow> {
    let tomorrow = today.checked_add_days(Days::new(1))?;
    match *spec {
        TimeRangeSpec::Preset { preset: Preset::Ytd } => Some(DateWindow {
            start: NaiveDate::from_ymd_opt(today.year(), 1, 1)?,
            end: tomorrow,
        }),
        TimeRangeSpec::Preset {
            preset: Preset::ThisMonth,
        } => Some(DateWindow {
            start: first_of_month(today)?,
            end: tomorrow,
        }),
        TimeRangeSpec::Preset {
            preset: Preset::LastMonth,
        } => {
            let first_this_month = first_of_month(today)?;
            Some(DateWindow {
                start: first_this_month.checked_sub_months(Months::new(1))?,
                end: first_this_month,
            })
        }
        TimeRangeSpec::Relative { last, unit } => {
            let days = u64::from(last.get()).checked_mul(unit.days())?;
            trailing_days(today, days)
        }
        TimeRangeSpec::Custom { start, end } => {
            if end < start {
                return None;
            }
            Some(DateWindow {
                start,
                end: end.checked_add_days(Days::new(1))?,
            })
        }
    }
}

fn trailing_days(today: NaiveDate, days: u64) -> Option<DateWindow> {
    Some(DateWindow {
        start: today.checked_sub_days(Days::new(days))?,
        end: today.checked_add_days(Days::new(1))?,
    })
}

fn first_of_month(d: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(d.year(), d.month(), 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::TimeUnit;
    use std::num::NonZeroU32;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn absent_spec_is_trailing_thirty_days() {
        let w = resolve_window(None, d(2024, 6, 15));
        assert_eq!(w.start, d(2024, 5, 16));
        assert_eq!(w.end, d(2024, 6, 16));
    }

    #[test]
    fn ytd_starts_on_january_first() {
        for today in [d(2024, 1, 1), d(2024, 6, 15), d(2023, 12, 31)] {
            let w = resolve_window(Some(&TimeRangeSpec::preset(Preset::Ytd)), today);
            assert_eq!(w.start, d(today.year(), 1, 1));
            assert_eq!(w.end, today.succ_opt().unwrap());
        }
    }

    #[test]
    fn last_month_is_the_whole_previous_calendar_month() {
        let w = resolve_window(Some(&TimeRangeSpec::preset(Preset::LastMonth)), d(2024, 3, 31));
        assert_eq!(w, DateWindow { start: d(2024, 2, 1), end: d(2024, 3, 1) });

        // January rolls back into December of the previous year.
        let w = resolve_window(Some(&TimeRangeSpec::preset(Preset::LastMonth)), d(2024, 1, 10));
        assert_eq!(w, DateWindow { start: d(2023, 12, 1), end: d(2024, 1, 1) });
    }

    #[test]
    fn this_month_runs_through_today() {
        let w = resolve_window(Some(&TimeRangeSpec::preset(Preset::ThisMonth)), d(2024, 2, 29));
        assert_eq!(w, DateWindow { start: d(2024, 2, 1), end: d(2024, 3, 1) });
    }

    #[test]
    fn relative_thirty_days() {
        let spec = TimeRangeSpec::relative(30, TimeUnit::Days).unwrap();
        let w = resolve_window(Some(&spec), d(2024, 6, 15));
        assert_eq!(w, DateWindow { start: d(2024, 5, 16), end: d(2024, 6, 16) });
    }

    #[test]
    fn relative_units_use_fixed_multipliers() {
        let today = d(2024, 6, 15);
        let months = resolve_window(Some(&TimeRangeSpec::trailing_months(3)), today);
        assert_eq!(months.start, d(2024, 3, 17)); // 90 days back
        let weeks = resolve_window(Some(&TimeRangeSpec::relative(2, TimeUnit::Weeks).unwrap()), today);
        assert_eq!(weeks.start, d(2024, 6, 1));
        let years = resolve_window(Some(&TimeRangeSpec::relative(1, TimeUnit::Years).unwrap()), today);
        assert_eq!(years.start, d(2023, 6, 16)); // 365 days across a leap day
    }

    #[test]
    fn custom_end_is_inclusive_in_input() {
        let spec = TimeRangeSpec::custom(d(2024, 1, 5), d(2024, 1, 20)).unwrap();
        let w = resolve_window(Some(&spec), d(2024, 6, 15));
        assert_eq!(w, DateWindow { start: d(2024, 1, 5), end: d(2024, 1, 21) });
        assert!(w.contains(d(2024, 1, 20)));
        assert!(!w.contains(d(2024, 1, 21)));
    }

    #[test]
    fn malformed_ranges_fall_back_to_default() {
        let today = d(2024, 6, 15);
        let default = resolve_window(None, today);

        let inverted = TimeRangeSpec::Custom { start: d(2024, 2, 1), end: d(2024, 1, 1) };
        assert_eq!(resolve_window(Some(&inverted), today), default);

        let huge = TimeRangeSpec::Relative { last: NonZeroU32::MAX, unit: TimeUnit::Years };
        assert_eq!(resolve_window(Some(&huge), today), default);
    }

    #[test]
    fn deterministic_for_same_inputs() {
        let spec = TimeRangeSpec::preset(Preset::LastMonth);
        let today = d(2025, 7, 4);
        assert_eq!(resolve_window(Some(&spec), today), resolve_window(Some(&spec), today));
    }
}
