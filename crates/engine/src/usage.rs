//! Monthly usage counting for plan caps.
//!
//! Usage is the number of distinct operations (group keys, or entry ids for
//! ungrouped entries) created inside a calendar month. Edits keep their group
//! key and creation time, so they never change the count.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{PlanTier, entries::operation_key};

/// An inclusive date range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    /// Calendar month containing `date`.
    #[must_use]
    pub fn month_of(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let end = start
            .checked_add_months(chrono::Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    /// Days remaining after `today` until the end of the period.
    pub fn days_left(&self, today: NaiveDate) -> u32 {
        let days = (self.end - today).num_days();
        u32::try_from(days.max(0)).unwrap_or(u32::MAX)
    }
}

/// Counts distinct operations among `(id, group_key)` rows.
pub fn count_distinct_operations<'a>(
    rows: impl IntoIterator<Item = (Uuid, Option<&'a str>)>,
) -> u64 {
    let keys: HashSet<String> = rows
        .into_iter()
        .map(|(id, group_key)| operation_key(group_key, id))
        .collect();
    keys.len() as u64
}

/// Usage of the monthly cap, as shown on a dashboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub plan: PlanTier,
    pub used: u64,
    /// `None` when the plan is uncapped.
    pub cap: Option<u32>,
    pub remaining: Option<u64>,
    pub days_left_in_period: u32,
    pub period: Period,
}

impl UsageSummary {
    pub fn new(plan: PlanTier, used: u64, cap: Option<u32>, period: Period, today: NaiveDate) -> Self {
        Self {
            plan,
            used,
            cap,
            remaining: cap.map(|cap| u64::from(cap).saturating_sub(used)),
            days_left_in_period: period.days_left(today),
            period,
        }
    }

    /// Whether one more operation may be created.
    pub fn allows_new_operation(&self) -> bool {
        self.cap.is_none_or(|cap| self.used < u64::from(cap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_bounds_handle_short_and_leap_months() {
        assert_eq!(
            Period::month_of(date(2026, 10, 19)),
            Period {
                start: date(2026, 10, 1),
                end: date(2026, 10, 31)
            }
        );
        assert_eq!(Period::month_of(date(2028, 2, 10)).end, date(2028, 2, 29));
        assert_eq!(Period::month_of(date(2026, 12, 31)).end, date(2026, 12, 31));
    }

    #[test]
    fn days_left_counts_after_today() {
        let period = Period::month_of(date(2026, 10, 19));
        assert_eq!(period.days_left(date(2026, 10, 19)), 12);
        assert_eq!(period.days_left(date(2026, 10, 31)), 0);
        assert_eq!(period.days_left(date(2026, 11, 2)), 0);
    }

    #[test]
    fn grouped_rows_count_once() {
        let rows = vec![
            (Uuid::new_v4(), Some("a")),
            (Uuid::new_v4(), Some("a")),
            (Uuid::new_v4(), Some("b")),
            (Uuid::new_v4(), None),
            (Uuid::new_v4(), Some(" ")),
        ];
        assert_eq!(count_distinct_operations(rows), 4);
    }

    #[test]
    fn remaining_saturates_and_uncapped_always_allows() {
        let period = Period::month_of(date(2026, 10, 1));
        let today = date(2026, 10, 1);

        let full = UsageSummary::new(PlanTier::Free, 25, Some(20), period, today);
        assert_eq!(full.remaining, Some(0));
        assert!(!full.allows_new_operation());

        let open = UsageSummary::new(PlanTier::Free, 19, Some(20), period, today);
        assert_eq!(open.remaining, Some(1));
        assert!(open.allows_new_operation());

        let unlimited = UsageSummary::new(PlanTier::Unlimited, 10_000, None, period, today);
        assert_eq!(unlimited.remaining, None);
        assert!(unlimited.allows_new_operation());
    }
}
