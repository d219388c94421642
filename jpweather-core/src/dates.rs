//! Calendar helpers shared by the acquisition policy and the views.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

/// How many days past today the forecast source serves.
pub const FORECAST_HORIZON_DAYS: u64 = 16;

/// How many days the archive source lags behind today.
pub const ARCHIVE_LAG_DAYS: u64 = 2;

const WEEKDAY_LABELS: [&str; 7] = ["日", "月", "火", "水", "木", "金", "土"];

/// Sunday that starts the week containing `anchor`, and the Saturday ending it.
pub fn week_range(anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = u64::from(anchor.weekday().num_days_from_sunday());
    let start = anchor.checked_sub_days(Days::new(offset)).unwrap_or(NaiveDate::MIN);
    let end = start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX);
    (start, end)
}

/// Short weekday plus day of month, e.g. `月 (10)`.
pub fn day_label(date: NaiveDate) -> String {
    let weekday = WEEKDAY_LABELS[date.weekday().num_days_from_sunday() as usize];
    format!("{weekday} ({})", date.day())
}

/// Last date the forecast source will serve.
pub fn max_forecast_date(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_days(Days::new(FORECAST_HORIZON_DAYS))
        .unwrap_or(NaiveDate::MAX)
}

/// Dates before this are only reliably served by the archive source.
pub fn recent_cutoff(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_days(Days::new(ARCHIVE_LAG_DAYS))
        .unwrap_or(NaiveDate::MIN)
}

/// Where a selected date sits relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizonStatus {
    Past,
    Today,
    Forecast,
    BeyondHorizon,
}

impl HorizonStatus {
    pub fn classify(date: NaiveDate, today: NaiveDate) -> Self {
        if date > max_forecast_date(today) {
            HorizonStatus::BeyondHorizon
        } else if date > today {
            HorizonStatus::Forecast
        } else if date == today {
            HorizonStatus::Today
        } else {
            HorizonStatus::Past
        }
    }

    /// Dates after today are shown with a forecast badge.
    pub fn is_future(self) -> bool {
        matches!(self, HorizonStatus::Forecast | HorizonStatus::BeyondHorizon)
    }
}
