use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt::Debug;
use tracing::debug;

use crate::{
    dates::{max_forecast_date, recent_cutoff},
    error::SourceError,
    model::{Coordinate, HourlyRecord},
};

pub mod open_meteo;

pub use open_meteo::OpenMeteoProvider;

/// Hourly fields requested from either source.
pub const CORE_FIELDS: [&str; 13] = [
    "temperature_2m",
    "apparent_temperature",
    "precipitation",
    "relative_humidity_2m",
    "surface_pressure",
    "visibility",
    "cloud_cover",
    "wind_speed_10m",
    "wind_direction_10m",
    "wind_gusts_10m",
    "snowfall",
    "snow_depth",
    "weather_code",
];

/// Hourly fields only the forecast source provides.
pub const FORECAST_ONLY_FIELDS: [&str; 3] = ["precipitation_probability", "uv_index", "cape"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSource {
    /// Recent past through the forecast horizon.
    Forecast,
    /// Older observed data only.
    Archive,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Forecast => "forecast",
            DataSource::Archive => "archive",
        }
    }

    pub fn hourly_fields(&self) -> Vec<&'static str> {
        let mut fields = CORE_FIELDS.to_vec();
        if *self == DataSource::Forecast {
            fields.extend_from_slice(&FORECAST_ONLY_FIELDS);
        }
        fields
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which source to query and over which dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub source: DataSource,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub fields: Vec<&'static str>,
}

/// Decide how to serve `start..=end` as of `today`.
///
/// Returns `None` when the whole range starts past the forecast horizon, in
/// which case no upstream call should be made.
pub fn plan_fetch(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Option<FetchPlan> {
    let max_forecast = max_forecast_date(today);
    if start > max_forecast {
        return None;
    }

    let source = if end >= recent_cutoff(today) {
        DataSource::Forecast
    } else {
        DataSource::Archive
    };

    let end = if source == DataSource::Forecast && end > max_forecast {
        max_forecast
    } else {
        end
    };

    Some(FetchPlan { source, start, end, fields: source.hourly_fields() })
}

/// Source of "today" for the horizon rules.
pub trait Clock: Send + Sync + Debug {
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Hourly records for `start..=end`, possibly empty.
    async fn fetch_range(
        &self,
        coordinate: Coordinate,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HourlyRecord>, SourceError>;
}

pub(crate) fn log_plan(plan: &FetchPlan, coordinate: Coordinate) {
    debug!(
        source = %plan.source,
        start = %plan.start,
        end = %plan.end,
        %coordinate,
        "planned weather fetch"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn range_past_horizon_is_not_planned() {
        let today = date(2024, 6, 10);
        assert_eq!(plan_fetch(date(2024, 7, 1), date(2024, 7, 7), today), None);
        assert_eq!(plan_fetch(date(2024, 6, 27), date(2024, 6, 27), today), None);
    }

    #[test]
    fn range_starting_on_horizon_is_planned() {
        let today = date(2024, 6, 10);
        let plan = plan_fetch(date(2024, 6, 26), date(2024, 6, 29), today).expect("plan");
        assert_eq!(plan.source, DataSource::Forecast);
        assert_eq!(plan.end, date(2024, 6, 26));
    }

    #[test]
    fn old_range_uses_archive_without_forecast_fields() {
        let today = date(2024, 6, 10);
        let plan = plan_fetch(date(2024, 6, 1), date(2024, 6, 7), today).expect("plan");
        assert_eq!(plan.source, DataSource::Archive);
        assert_eq!(plan.end, date(2024, 6, 7));
        assert_eq!(plan.fields, CORE_FIELDS.to_vec());
        for field in FORECAST_ONLY_FIELDS {
            assert!(!plan.fields.contains(&field));
        }
    }

    #[test]
    fn range_ending_on_cutoff_uses_forecast() {
        let today = date(2024, 6, 10);
        let plan = plan_fetch(date(2024, 6, 2), date(2024, 6, 8), today).expect("plan");
        assert_eq!(plan.source, DataSource::Forecast);
        assert_eq!(plan.end, date(2024, 6, 8));
    }

    #[test]
    fn range_ending_today_uses_forecast_with_extra_fields() {
        let today = date(2024, 6, 10);
        let plan = plan_fetch(date(2024, 6, 4), today, today).expect("plan");
        assert_eq!(plan.source, DataSource::Forecast);
        for field in FORECAST_ONLY_FIELDS {
            assert!(plan.fields.contains(&field));
        }
        assert_eq!(plan.fields.len(), CORE_FIELDS.len() + FORECAST_ONLY_FIELDS.len());
    }

    #[test]
    fn forecast_end_is_clamped_to_horizon() {
        let today = date(2024, 6, 10);
        let plan = plan_fetch(date(2024, 6, 23), date(2024, 6, 29), today).expect("plan");
        assert_eq!(plan.source, DataSource::Forecast);
        assert_eq!(plan.start, date(2024, 6, 23));
        assert_eq!(plan.end, date(2024, 6, 26));
    }

    #[test]
    fn system_clock_is_close_to_utc_today() {
        let today = SystemClock.today();
        let utc = chrono::Utc::now().date_naive();
        assert!((today - utc).num_days().abs() <= 1);
    }
}
