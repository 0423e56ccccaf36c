use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// First month of the fiscal year (September 1 through August 31).
pub const FISCAL_YEAR_START_MONTH: u32 = 9;

/// An inclusive day interval `[start, end]`.
///
/// All report windows operate at day granularity. Weekly windows end on a
/// Sunday and the following window starts on the next Monday, so inclusive
/// bounds never place one date in two adjacent weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Whether an optional event date falls inside the window. Records
    /// without a parseable date never match any window.
    pub fn contains_opt(&self, date: Option<NaiveDate>) -> bool {
        date.map(|d| self.contains(d)).unwrap_or(false)
    }
}

/// The September 1 that starts the fiscal year containing `as_of`.
pub fn fiscal_year_start(as_of: NaiveDate) -> NaiveDate {
    let year = if as_of.month() >= FISCAL_YEAR_START_MONTH {
        as_of.year()
    } else {
        as_of.year() - 1
    };
    NaiveDate::from_ymd_opt(year, FISCAL_YEAR_START_MONTH, 1).expect("Sept 1 is always valid")
}

/// First day of `as_of`'s calendar month.
pub fn month_start(as_of: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(as_of.year(), as_of.month(), 1).expect("day 1 is always valid")
}

/// The Monday on or before `date`.
pub fn week_start_on_or_before(date: NaiveDate) -> NaiveDate {
    let days_since_monday = date.weekday().num_days_from_monday() as u64;
    date.checked_sub_days(Days::new(days_since_monday))
        .expect("date minus at most 6 days is in range")
}

/// Monday-aligned weekly windows covering `[fiscal_year_start, as_of]`.
///
/// Starts at the Monday on or before `fiscal_year_start` and walks forward a
/// week at a time, pairing each Monday with `min(monday + 6 days, as_of)`.
/// If `as_of` falls mid-week the final window is truncated, so its figures
/// are partial by construction.
pub fn weekly_windows(fiscal_year_start: NaiveDate, as_of: NaiveDate) -> Vec<DateWindow> {
    let mut windows = Vec::new();
    let mut monday = week_start_on_or_before(fiscal_year_start);

    while monday <= as_of {
        let sunday = monday + Days::new(6);
        windows.push(DateWindow::new(monday, sunday.min(as_of)));
        monday = monday + Days::new(7);
    }

    windows
}

/// The three reporting windows evaluated "as of" a reference date.
pub fn ytd_window(as_of: NaiveDate) -> DateWindow {
    DateWindow::new(fiscal_year_start(as_of), as_of)
}

pub fn mtd_window(as_of: NaiveDate) -> DateWindow {
    DateWindow::new(month_start(as_of), as_of)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_fiscal_year_start_boundaries() {
        assert_eq!(fiscal_year_start(date(2024, 8, 31)), date(2023, 9, 1));
        assert_eq!(fiscal_year_start(date(2024, 9, 1)), date(2024, 9, 1));
        assert_eq!(fiscal_year_start(date(2024, 12, 15)), date(2024, 9, 1));
        assert_eq!(fiscal_year_start(date(2025, 1, 2)), date(2024, 9, 1));
    }

    #[test]
    fn test_month_start() {
        assert_eq!(month_start(date(2024, 2, 29)), date(2024, 2, 1));
        assert_eq!(month_start(date(2024, 12, 1)), date(2024, 12, 1));
    }

    #[test]
    fn test_week_start_on_or_before() {
        // 2024-09-01 is a Sunday; the Monday before is Aug 26.
        assert_eq!(week_start_on_or_before(date(2024, 9, 1)), date(2024, 8, 26));
        // A Monday maps to itself.
        assert_eq!(week_start_on_or_before(date(2024, 8, 26)), date(2024, 8, 26));
    }

    #[test]
    fn test_weekly_windows_tile_without_gaps() {
        let fy_start = fiscal_year_start(date(2024, 11, 20));
        let windows = weekly_windows(fy_start, date(2024, 11, 20));

        assert!(!windows.is_empty());
        assert_eq!(windows[0].start, date(2024, 8, 26));

        for window in &windows {
            assert_eq!(window.start.weekday(), Weekday::Mon);
            assert!(window.start <= window.end);
        }
        for pair in windows.windows(2) {
            // Full weeks span Monday..Sunday and abut exactly.
            assert_eq!(pair[0].end + Days::new(1), pair[1].start);
            assert_eq!(pair[0].end, pair[0].start + Days::new(6));
        }

        // 2024-11-20 is a Wednesday, so the last window is truncated.
        let last = windows.last().unwrap();
        assert_eq!(last.start, date(2024, 11, 18));
        assert_eq!(last.end, date(2024, 11, 20));
    }

    #[test]
    fn test_weekly_windows_as_of_sunday_is_not_truncated() {
        let windows = weekly_windows(date(2024, 9, 1), date(2024, 9, 8));
        let last = windows.last().unwrap();
        assert_eq!(last.start, date(2024, 9, 2));
        assert_eq!(last.end, date(2024, 9, 8));
    }

    #[test]
    fn test_window_contains() {
        let window = DateWindow::new(date(2024, 9, 2), date(2024, 9, 8));
        assert!(window.contains(date(2024, 9, 2)));
        assert!(window.contains(date(2024, 9, 8)));
        assert!(!window.contains(date(2024, 9, 9)));
        assert!(!window.contains_opt(None));
        assert!(window.contains_opt(Some(date(2024, 9, 5))));
    }

    #[test]
    fn test_ytd_and_mtd_window_ordering() {
        let as_of = date(2025, 3, 14);
        let ytd = ytd_window(as_of);
        let mtd = mtd_window(as_of);
        assert!(ytd.start <= mtd.start);
        assert_eq!(ytd.end, as_of);
        assert_eq!(mtd.end, as_of);
    }
}
