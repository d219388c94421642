//! Folding an hourly series into per-day views.
//!
//! Everything here is derived from the fetched sequence on demand; nothing is
//! cached or mutated in place.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::{DailySummary, HourlyRecord, WeatherCode};

/// Index of the local-noon record within a full day starting at midnight.
pub const REPRESENTATIVE_HOUR_INDEX: usize = 12;

/// Partition by calendar date, keeping input order within each day.
pub fn group_by_day(records: &[HourlyRecord]) -> BTreeMap<NaiveDate, Vec<HourlyRecord>> {
    let mut days: BTreeMap<NaiveDate, Vec<HourlyRecord>> = BTreeMap::new();
    for record in records {
        days.entry(record.date()).or_default().push(record.clone());
    }
    days
}

/// Condition code of the noon record, or of the first record for short days.
pub fn representative_code(day: &[HourlyRecord]) -> Option<WeatherCode> {
    day.get(REPRESENTATIVE_HOUR_INDEX)
        .and_then(|r| r.weather_code)
        .or_else(|| day.first().and_then(|r| r.weather_code))
}

/// Summary of one day's records, or `None` if there is nothing to summarize.
pub fn summarize(day: &[HourlyRecord]) -> Option<DailySummary> {
    let first = day.first()?;
    let temps = present(day, |r| r.temperature_2m);
    let max_temp = max(&temps)?;
    let min_temp = min(&temps)?;

    Some(DailySummary {
        date: first.date(),
        max_temp,
        min_temp,
        precipitation: present(day, |r| r.precipitation).iter().sum(),
        condition: representative_code(day),
    })
}

/// One summary per day present in `records`, dates ascending.
pub fn daily_summaries(records: &[HourlyRecord]) -> Vec<DailySummary> {
    group_by_day(records)
        .values()
        .filter_map(|day| summarize(day))
        .collect()
}

/// Records falling on `date`, in original order.
pub fn filter_for_day(records: &[HourlyRecord], date: NaiveDate) -> Vec<HourlyRecord> {
    records.iter().filter(|r| r.date() == date).cloned().collect()
}

fn present(day: &[HourlyRecord], field: impl Fn(&HourlyRecord) -> Option<f64>) -> Vec<f64> {
    day.iter().filter_map(field).collect()
}

fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn total(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum())
}

/// Circular mean of directions in degrees, in `[0, 360)`.
fn mean_direction(degrees: &[f64]) -> Option<f64> {
    if degrees.is_empty() {
        return None;
    }
    let (sin, cos) = degrees.iter().fold((0.0, 0.0), |(s, c), d| {
        let rad = d.to_radians();
        (s + rad.sin(), c + rad.cos())
    });
    if sin.abs() < f64::EPSILON && cos.abs() < f64::EPSILON {
        return None;
    }
    Some(sin.atan2(cos).to_degrees().rem_euclid(360.0))
}

/// Aggregates over one day, each absent when no record supplies the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DayStatistics {
    pub hours: usize,
    pub temperature_max_c: Option<f64>,
    pub temperature_min_c: Option<f64>,
    pub temperature_mean_c: Option<f64>,
    pub apparent_temperature_max_c: Option<f64>,
    pub apparent_temperature_min_c: Option<f64>,
    pub precipitation_total_mm: Option<f64>,
    pub precipitation_probability_max_pct: Option<f64>,
    pub humidity_mean_pct: Option<f64>,
    pub surface_pressure_mean_hpa: Option<f64>,
    pub visibility_min_m: Option<f64>,
    pub cloud_cover_mean_pct: Option<f64>,
    pub wind_speed_mean_kmh: Option<f64>,
    pub wind_speed_max_kmh: Option<f64>,
    pub wind_gusts_max_kmh: Option<f64>,
    pub wind_direction_mean_deg: Option<f64>,
    pub snowfall_total_cm: Option<f64>,
    pub snow_depth_max_m: Option<f64>,
    pub uv_index_max: Option<f64>,
    pub cape_max_jkg: Option<f64>,
    pub condition: Option<&'static str>,
    pub weather_code: Option<WeatherCode>,
}

impl DayStatistics {
    pub fn from_records(day: &[HourlyRecord]) -> Self {
        let temps = present(day, |r| r.temperature_2m);
        let apparent = present(day, |r| r.apparent_temperature);
        let wind = present(day, |r| r.wind_speed_10m);
        let code = representative_code(day);

        Self {
            hours: day.len(),
            temperature_max_c: max(&temps),
            temperature_min_c: min(&temps),
            temperature_mean_c: mean(&temps),
            apparent_temperature_max_c: max(&apparent),
            apparent_temperature_min_c: min(&apparent),
            precipitation_total_mm: total(&present(day, |r| r.precipitation)),
            precipitation_probability_max_pct: max(&present(day, |r| r.precipitation_probability)),
            humidity_mean_pct: mean(&present(day, |r| r.relative_humidity_2m)),
            surface_pressure_mean_hpa: mean(&present(day, |r| r.surface_pressure)),
            visibility_min_m: min(&present(day, |r| r.visibility)),
            cloud_cover_mean_pct: mean(&present(day, |r| r.cloud_cover)),
            wind_speed_mean_kmh: mean(&wind),
            wind_speed_max_kmh: max(&wind),
            wind_gusts_max_kmh: max(&present(day, |r| r.wind_gusts_10m)),
            wind_direction_mean_deg: mean_direction(&present(day, |r| r.wind_direction_10m)),
            snowfall_total_cm: total(&present(day, |r| r.snowfall)),
            snow_depth_max_m: max(&present(day, |r| r.snow_depth)),
            uv_index_max: max(&present(day, |r| r.uv_index)),
            cape_max_jkg: max(&present(day, |r| r.cape)),
            condition: code.map(WeatherCode::label),
            weather_code: code,
        }
    }
}
