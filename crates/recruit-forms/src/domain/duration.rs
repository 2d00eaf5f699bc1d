//! Age and experience durations
//!
//! Durations are calendar differences (years, months, days), not day counts.
//! Sums use a flat 30-day month when carrying, which is approximate on purpose.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt::Write as _;

/// Calendar difference between two dates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Span {
    pub years: i32,
    pub months: i32,
    pub days: i32,
}

impl Span {
    pub fn new(years: i32, months: i32, days: i32) -> Self {
        Self { years, months, days }
    }

    /// Add components without carrying
    pub fn accumulate(&mut self, other: Span) {
        self.years += other.years;
        self.months += other.months;
        self.days += other.days;
    }

    /// Carry every 30 days into a month, then every 12 months into a year
    pub fn normalized(self) -> Span {
        let months = self.months + self.days.div_euclid(30);
        let days = self.days.rem_euclid(30);
        Span {
            years: self.years + months.div_euclid(12),
            months: months.rem_euclid(12),
            days,
        }
    }

    /// Age rendering: leading zero components are dropped
    pub fn format_age(&self) -> String {
        if self.years > 0 {
            self.format_full()
        } else if self.months > 0 {
            format!("{}, {}", unit(self.months, "month"), unit(self.days, "day"))
        } else {
            unit(self.days, "day")
        }
    }

    /// Experience rendering: all three components, zeros included
    pub fn format_full(&self) -> String {
        let mut out = unit(self.years, "year");
        let _ = write!(out, ", {}, {}", unit(self.months, "month"), unit(self.days, "day"));
        out
    }
}

fn unit(n: i32, name: &str) -> String {
    if n == 1 {
        format!("{} {}", n, name)
    } else {
        format!("{} {}s", n, name)
    }
}

/// Parse a stored `YYYY-MM-DD` value; timestamps are cut to their date part
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

fn days_in_month(year: i32, month: u32) -> i32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    match (NaiveDate::from_ymd_opt(year, month, 1), NaiveDate::from_ymd_opt(next_year, next_month, 1)) {
        (Some(first), Some(next)) => (next - first).num_days() as i32,
        _ => 30,
    }
}

/// Calendar difference `end - start`.
///
/// Negative days borrow the length of the month before `end`, then of each
/// earlier month, until non-negative; negative months borrow 12.
pub fn compute_duration(start: NaiveDate, end: NaiveDate) -> Span {
    let mut years = end.year() - start.year();
    let mut months = end.month() as i32 - start.month() as i32;
    let mut days = end.day() as i32 - start.day() as i32;

    let (mut year, mut month) = (end.year(), end.month());
    while days < 0 {
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
        days += days_in_month(year, month);
        months -= 1;
    }
    while months < 0 {
        years -= 1;
        months += 12;
    }
    Span { years, months, days }
}

/// Sum the durations of every pair with two parsable dates, then normalize
pub fn sum_durations<'a, I>(pairs: I) -> Span
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut total = Span::default();
    for (start, end) in pairs {
        if let (Some(start), Some(end)) = (parse_iso_date(start), parse_iso_date(end)) {
            total.accumulate(compute_duration(start, end));
        }
    }
    total.normalized()
}

/// Age line shown beside a birth date field; empty when there is no birth date
pub fn age_line(birth: &str, as_on: Option<NaiveDate>, today: NaiveDate) -> String {
    let Some(birth) = parse_iso_date(birth) else {
        return String::new();
    };
    match as_on {
        Some(reference) => format!(
            "Age as on {}: {}",
            reference.format("%d/%m/%Y"),
            compute_duration(birth, reference).format_age()
        ),
        None => format!("Age: {}", compute_duration(birth, today).format_age()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_compute_duration_borrows_days() {
        assert_eq!(compute_duration(date(1990, 5, 15), date(2020, 5, 10)), Span::new(29, 11, 25));
        assert_eq!(compute_duration(date(2019, 3, 1), date(2020, 3, 1)), Span::new(1, 0, 0));
    }

    #[test]
    fn test_compute_duration_across_february() {
        // Borrowing repeats until days are non-negative. In 2020, 1 - 31 + 29 (Feb)
        // is still -1, so January's 31 days are borrowed too, giving 30 rather
        // than 29. Only the non-leap year lands on 29 after a single borrow.
        assert_eq!(compute_duration(date(2020, 1, 31), date(2020, 3, 1)), Span::new(0, 0, 30));
        assert_eq!(compute_duration(date(2021, 1, 31), date(2021, 3, 1)), Span::new(0, 0, 29));
        assert_eq!(compute_duration(date(2020, 1, 15), date(2020, 3, 10)), Span::new(0, 1, 24));
    }

    #[test]
    fn test_sum_normalizes_with_thirty_day_months() {
        let mut raw = Span::new(1, 7, 20);
        raw.accumulate(Span::new(0, 6, 25));
        assert_eq!(raw, Span::new(1, 13, 45));
        assert_eq!(raw.normalized(), Span::new(2, 2, 15));
    }

    #[test]
    fn test_sum_skips_incomplete_pairs() {
        let total = sum_durations([
            ("2018-01-01", "2019-08-21"),
            ("2019-09-01", ""),
            ("not-a-date", "2020-01-01"),
            ("2020-01-01", "2020-07-26"),
        ]);
        // 1y 7m 20d + 0y 6m 25d
        assert_eq!(total, Span::new(2, 2, 15));
        assert_eq!(sum_durations(std::iter::empty()), Span::default());
    }

    #[test]
    fn test_formatting() {
        assert_eq!(Span::new(2, 1, 0).format_age(), "2 years, 1 month, 0 days");
        assert_eq!(Span::new(0, 3, 1).format_age(), "3 months, 1 day");
        assert_eq!(Span::new(0, 0, 12).format_age(), "12 days");
        assert_eq!(Span::new(0, 0, 0).format_full(), "0 years, 0 months, 0 days");
    }

    #[test]
    fn test_age_line() {
        let today = date(2024, 6, 1);
        assert_eq!(age_line("", None, today), "");
        assert_eq!(age_line("garbage", None, today), "");
        assert_eq!(age_line("2000-06-01", None, today), "Age: 24 years, 0 months, 0 days");
        assert_eq!(
            age_line("2000-06-01", Some(date(2024, 1, 1)), today),
            "Age as on 01/01/2024: 23 years, 7 months, 0 days"
        );
    }

    #[test]
    fn test_parse_iso_date_accepts_timestamps() {
        assert_eq!(parse_iso_date("2024-02-29T00:00:00Z"), Some(date(2024, 2, 29)));
        assert_eq!(parse_iso_date(" 2024-02-01 "), Some(date(2024, 2, 1)));
        assert_eq!(parse_iso_date("2023-02-29"), None);
    }
}
