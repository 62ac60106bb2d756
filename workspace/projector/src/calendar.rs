//! Calendar arithmetic helpers shared by the resolver and aggregator.
//! All functions operate on naive calendar dates; months are 1-based.

use chrono::{Datelike, NaiveDate};

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    // Create a date for the first day of the next month
    let next_month_year = year + (month / 12) as i32;
    let next_month = (month % 12) + 1;

    // Get the first day of the next month
    let first_day_next_month = NaiveDate::from_ymd_opt(next_month_year, next_month, 1).unwrap();

    // Go back one day to get the last day of the current month
    let last_day_current_month = first_day_next_month.pred_opt().unwrap();

    // The day of the month is the number of days in the month
    last_day_current_month.day()
}

/// Clamps a due day to the last valid day of the given month, so a
/// schedule due on the 31st falls on Feb 28/29, Apr 30 and so on.
pub fn clamp_day(day: u32, year: i32, month: u32) -> u32 {
    day.clamp(1, days_in_month(year, month))
}

/// Builds the due date for a (year, month) period with the day clamped.
pub fn due_date_in_month(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, clamp_day(day, year, month))
}

/// English ordinal suffix for a day of month: 1st, 2nd, 3rd, 4th, ...
pub fn ordinal_suffix(day: u32) -> &'static str {
    match day % 100 {
        11..=13 => "th",
        _ => match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn february_length_follows_leap_years() {
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
    }

    #[test]
    fn thirty_day_months() {
        for month in [4, 6, 9, 11] {
            assert_eq!(days_in_month(2026, month), 30);
        }
        assert_eq!(days_in_month(2026, 12), 31);
    }

    #[test]
    fn clamp_day_shortens_to_month_end() {
        assert_eq!(clamp_day(31, 2026, 2), 28);
        assert_eq!(clamp_day(31, 2028, 2), 29);
        assert_eq!(clamp_day(31, 2026, 4), 30);
        assert_eq!(clamp_day(15, 2026, 4), 15);
    }

    #[test]
    fn clamp_day_raises_zero_to_first() {
        // Degenerate input from an unvalidated row; never a panic.
        assert_eq!(clamp_day(0, 2026, 1), 1);
    }

    #[test]
    fn ordinal_suffixes() {
        assert_eq!(ordinal_suffix(1), "st");
        assert_eq!(ordinal_suffix(2), "nd");
        assert_eq!(ordinal_suffix(3), "rd");
        assert_eq!(ordinal_suffix(4), "th");
        assert_eq!(ordinal_suffix(11), "th");
        assert_eq!(ordinal_suffix(12), "th");
        assert_eq!(ordinal_suffix(13), "th");
        assert_eq!(ordinal_suffix(21), "st");
        assert_eq!(ordinal_suffix(22), "nd");
        assert_eq!(ordinal_suffix(23), "rd");
        assert_eq!(ordinal_suffix(31), "st");
    }
}
