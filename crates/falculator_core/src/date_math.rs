//! Calendar arithmetic for the simulation clock.
//!
//! The tick loop and every schedule evaluation run on whole-day civil
//! dates. jiff's `Span` machinery is correct but heavyweight for code
//! called once per item per tick, so the helpers here work on Rata Die
//! day numbers (days since 0001-01-01 in the proleptic Gregorian
//! calendar) and do month/year stepping with direct calendar arithmetic.
//!
//! Rata Die day 1 is 0001-01-01, which is a Monday; weekday and
//! fortnight anchoring below rely on that.

use jiff::civil::Date;

/// Leap year in the proleptic Gregorian calendar.
#[inline]
pub fn is_leap_year(year: i16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Days in a calendar month, without constructing a `Date`.
#[inline]
pub fn days_in_month(year: i16, month: i8) -> i8 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Rata Die day number for a civil date (Baum's algorithm, O(1)).
#[inline]
pub fn day_number(d: Date) -> i32 {
    let y = i32::from(d.year());
    let m = i32::from(d.month());
    let day = i32::from(d.day());

    // March-anchored year so February is the last month of the shifted year
    let shift = (14 - m) / 12;
    let y2 = y - shift;
    let m2 = m + 12 * shift - 3;

    day + (153 * m2 + 2) / 5 + 365 * y2 + y2 / 4 - y2 / 100 + y2 / 400 - 306
}

/// Inverse of [`day_number`].
#[inline]
pub fn date_from_day_number(rd: i32) -> Date {
    let z = rd + 306;
    let h = 100 * z - 25;
    let a = h / 3_652_425;
    let b = a - a / 4;
    let y = (100 * b + h) / 36_525;
    let c = b + z - 365 * y - y / 4;
    let m = (5 * c + 456) / 153;
    let day = c - (153 * m - 457) / 5;

    let (year, month) = if m > 12 { (y + 1, m - 12) } else { (y, m) };
    jiff::civil::date(year as i16, month as i8, day as i8)
}

/// `b - a` in whole days; positive when `b` is later.
#[inline]
pub fn days_between(a: Date, b: Date) -> i32 {
    day_number(b) - day_number(a)
}

#[inline]
pub fn add_days(d: Date, n: i32) -> Date {
    date_from_day_number(day_number(d) + n)
}

/// Weekday as an offset from Monday: 0 = Monday .. 6 = Sunday.
#[inline]
pub fn weekday_offset(d: Date) -> i32 {
    (day_number(d) - 1).rem_euclid(7)
}

/// Add calendar months, clamping the day into the destination month
/// (Jan 31 + 1 month = Feb 28/29).
pub fn add_months(d: Date, months: i32) -> Date {
    let total = i32::from(d.year()) * 12 + i32::from(d.month()) - 1 + months;
    let year = total.div_euclid(12) as i16;
    let month = (total.rem_euclid(12) + 1) as i8;
    let day = d.day().min(days_in_month(year, month));
    jiff::civil::date(year, month, day)
}

/// Add calendar years, clamping Feb 29 to Feb 28 off leap years.
pub fn add_years(d: Date, years: i32) -> Date {
    let year = (i32::from(d.year()) + years) as i16;
    let day = d.day().min(days_in_month(year, d.month()));
    jiff::civil::date(year, d.month(), day)
}

/// Whole elapsed years from `from` to `to`, floored. Negative spans
/// floor toward zero from below (a date before `from` yields a negative
/// count). This is the simulation's age function.
pub fn whole_years_between(from: Date, to: Date) -> i32 {
    let mut years = i32::from(to.year()) - i32::from(from.year());
    if (to.month(), to.day()) < (from.month(), from.day()) {
        years -= 1;
    }
    years
}
