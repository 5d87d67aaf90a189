//! Calendar schedules for recurring amounts.
//!
//! An [`AmountSchedule`] is a pure calendar predicate: given two dates
//! it reports how many times it fires in the half-open interval
//! `(prev, curr]`. Schedules never advance their own `trigger_count`;
//! the caller records fires once the payment they gate has actually
//! produced an effect.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::date_math::{add_months, add_years, day_number, days_in_month};
use crate::model::ids::ItemId;
use crate::sanitize::SanitizeReport;
use crate::serde_util::named_enum;

named_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum Frequency {
        Daily = 0,
        Weekly = 1,
        Fortnightly = 2,
        #[default]
        Monthly = 3,
        Annual = 4,
    }
}

named_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum DayOfWeek {
        #[default]
        Monday = 0,
        Tuesday = 1,
        Wednesday = 2,
        Thursday = 3,
        Friday = 4,
        Saturday = 5,
        Sunday = 6,
    }
}

impl DayOfWeek {
    /// Offset from Monday, matching [`crate::date_math::weekday_offset`].
    pub const fn offset(self) -> i32 {
        self as i32
    }
}

/// When and how often an amount fires.
///
/// `day_of_month = 31` means "last day of the month" for months with
/// fewer days. `trigger_limit = 0` means unlimited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmountSchedule {
    pub frequency: Frequency,
    pub day_of_week: Option<DayOfWeek>,
    pub day_of_month: Option<i8>,
    pub month_of_year: Option<i8>,
    pub trigger_limit: u32,
    pub trigger_count: u32,
}

impl Default for AmountSchedule {
    fn default() -> Self {
        Self {
            frequency: Frequency::Monthly,
            day_of_week: None,
            day_of_month: None,
            month_of_year: None,
            trigger_limit: 0,
            trigger_count: 0,
        }
    }
}

impl AmountSchedule {
    pub fn monthly(day_of_month: i8) -> Self {
        Self {
            frequency: Frequency::Monthly,
            day_of_month: Some(day_of_month),
            ..Self::default()
        }
    }

    /// The schedule mandated for monthly-compounded interest: monthly,
    /// last day of month, unlimited.
    pub fn monthly_compounding() -> Self {
        Self::monthly(31)
    }

    /// Number of fires in `(prev, curr]`, capped by the remaining
    /// trigger budget. Does not mutate `trigger_count`.
    pub fn occurrences(&self, prev: Date, curr: Date) -> u32 {
        if curr <= prev {
            return 0;
        }
        let fired = match self.frequency {
            Frequency::Daily => (day_number(curr) - day_number(prev)).max(0) as u32,
            Frequency::Weekly => self.periodic_occurrences(prev, curr, 7),
            Frequency::Fortnightly => self.periodic_occurrences(prev, curr, 14),
            Frequency::Monthly => self.monthly_occurrences(prev, curr),
            Frequency::Annual => self.annual_occurrences(prev, curr),
        };
        fired.min(self.remaining())
    }

    /// Record `n` fires after the gated payment took effect.
    pub fn record(&mut self, n: u32) {
        self.trigger_count = self.trigger_count.saturating_add(n);
    }

    fn remaining(&self) -> u32 {
        if self.trigger_limit == 0 {
            u32::MAX
        } else {
            self.trigger_limit.saturating_sub(self.trigger_count)
        }
    }

    /// Weekly and fortnightly counting on Rata Die residues. Day 1
    /// (0001-01-01) is a Monday, so a date fires iff its day number is
    /// congruent to `1 + weekday` modulo the period; the fortnight
    /// anchor is the epoch Monday itself.
    fn periodic_occurrences(&self, prev: Date, curr: Date, period: i32) -> u32 {
        let weekday = self.day_of_week.unwrap_or_default().offset();
        let residue = (1 + weekday).rem_euclid(period);
        let lo = day_number(prev) + 1;
        let hi = day_number(curr);
        let first = lo + (residue - lo).rem_euclid(period);
        if first > hi {
            0
        } else {
            ((hi - first) / period + 1) as u32
        }
    }

    fn monthly_occurrences(&self, prev: Date, curr: Date) -> u32 {
        let day = self.day_of_month.unwrap_or(31);
        let mut count = 0;
        let mut cursor = jiff::civil::date(prev.year(), prev.month(), 1);
        let end = jiff::civil::date(curr.year(), curr.month(), 1);
        while cursor <= end {
            let fire_day = day.min(days_in_month(cursor.year(), cursor.month()));
            let fire = jiff::civil::date(cursor.year(), cursor.month(), fire_day);
            if fire > prev && fire <= curr {
                count += 1;
            }
            cursor = add_months(cursor, 1);
        }
        count
    }

    fn annual_occurrences(&self, prev: Date, curr: Date) -> u32 {
        let month = self.month_of_year.unwrap_or(1);
        let day = self.day_of_month.unwrap_or(31);
        let mut count = 0;
        let mut cursor = jiff::civil::date(prev.year(), 1, 1);
        let end = jiff::civil::date(curr.year(), 1, 1);
        while cursor <= end {
            let fire_day = day.min(days_in_month(cursor.year(), month));
            let fire = jiff::civil::date(cursor.year(), month, fire_day);
            if fire > prev && fire <= curr {
                count += 1;
            }
            cursor = add_years(cursor, 1);
        }
        count
    }

    /// Clamp out-of-range anchors and materialize the defaults the
    /// frequency needs.
    pub fn sanitize(&mut self, owner: ItemId, report: &mut SanitizeReport) {
        if let Some(day) = self.day_of_month
            && !(1..=31).contains(&day)
        {
            let clamped = day.clamp(1, 31);
            report.correct(owner, format!("schedule day_of_month {day} clamped to {clamped}"));
            self.day_of_month = Some(clamped);
        }
        if let Some(month) = self.month_of_year
            && !(1..=12).contains(&month)
        {
            let clamped = month.clamp(1, 12);
            report.correct(owner, format!("schedule month_of_year {month} clamped to {clamped}"));
            self.month_of_year = Some(clamped);
        }
        match self.frequency {
            Frequency::Weekly | Frequency::Fortnightly => {
                if self.day_of_week.is_none() {
                    self.day_of_week = Some(DayOfWeek::Monday);
                }
            }
            Frequency::Monthly => {
                if self.day_of_month.is_none() {
                    self.day_of_month = Some(31);
                }
                if self.month_of_year.is_some() {
                    report.correct(owner, "monthly schedule has no month_of_year; cleared");
                    self.month_of_year = None;
                }
            }
            Frequency::Annual => {
                if self.day_of_month.is_none() {
                    self.day_of_month = Some(31);
                }
                if self.month_of_year.is_none() {
                    self.month_of_year = Some(1);
                }
            }
            Frequency::Daily => {}
        }
    }
}
