//! Rolling windows used by the seller sales report.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;

/// A trailing window measured back from the start of "today" (UTC).
///
/// An order counts towards a window when its `created_at` is strictly after
/// [`SalesWindow::cutoff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesWindow {
    Weekly,
    Monthly,
    Yearly,
}

impl SalesWindow {
    pub const ALL: [SalesWindow; 3] = [Self::Weekly, Self::Monthly, Self::Yearly];

    #[must_use]
    pub fn days(self) -> u64 {
        match self {
            Self::Weekly => 7,
            Self::Monthly => 30,
            Self::Yearly => 365,
        }
    }

    /// Midnight UTC `days()` days before `today`.
    #[must_use]
    pub fn cutoff(self, today: NaiveDate) -> DateTime<Utc> {
        start_of_day(today.checked_sub_days(Days::new(self.days())).unwrap_or(NaiveDate::MIN))
    }
}

impl std::fmt::Display for SalesWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SalesWindow::Weekly => write!(f, "weekly"),
            SalesWindow::Monthly => write!(f, "monthly"),
            SalesWindow::Yearly => write!(f, "yearly"),
        }
    }
}

/// Number of trailing days covered by the per-day breakdown.
pub const DAILY_BREAKDOWN_DAYS: u64 = 30;

#[must_use]
pub fn daily_breakdown_cutoff(today: NaiveDate) -> DateTime<Utc> {
    start_of_day(
        today
            .checked_sub_days(Days::new(DAILY_BREAKDOWN_DAYS))
            .unwrap_or(NaiveDate::MIN),
    )
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn window_lengths() {
        assert_eq!(SalesWindow::Weekly.days(), 7);
        assert_eq!(SalesWindow::Monthly.days(), 30);
        assert_eq!(SalesWindow::Yearly.days(), 365);
    }

    #[test]
    fn weekly_cutoff_is_midnight_seven_days_back() {
        let cutoff = SalesWindow::Weekly.cutoff(date(2026, 3, 10));
        assert_eq!(cutoff.to_rfc3339(), "2026-03-03T00:00:00+00:00");
    }

    #[test]
    fn yearly_cutoff_crosses_year_boundary() {
        let cutoff = SalesWindow::Yearly.cutoff(date(2026, 1, 15));
        assert_eq!(cutoff.date_naive(), date(2025, 1, 15));
    }

    #[test]
    fn daily_breakdown_matches_monthly_window() {
        let today = date(2026, 10, 19);
        assert_eq!(daily_breakdown_cutoff(today), SalesWindow::Monthly.cutoff(today));
        assert_eq!(DAILY_BREAKDOWN_DAYS, SalesWindow::Monthly.days());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&SalesWindow::Monthly).expect("serialize");
        assert_eq!(json, "\"monthly\"");
        assert_eq!(SalesWindow::Yearly.to_string(), "yearly");
    }
}
