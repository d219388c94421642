use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

use crate::{
    error::SourceError,
    model::{Coordinate, HourlyRecord, WeatherCode},
    provider::{Clock, DataSource, FetchPlan, SystemClock, WeatherProvider, log_plan, plan_fetch},
};

pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
pub const TIMEZONE: &str = "Asia/Tokyo";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenMeteoEndpoints {
    pub forecast: String,
    pub archive: String,
}

impl Default for OpenMeteoEndpoints {
    fn default() -> Self {
        Self {
            forecast: DEFAULT_FORECAST_URL.to_string(),
            archive: DEFAULT_ARCHIVE_URL.to_string(),
        }
    }
}

impl OpenMeteoEndpoints {
    fn url_for(&self, source: DataSource) -> &str {
        match source {
            DataSource::Forecast => &self.forecast,
            DataSource::Archive => &self.archive,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    endpoints: OpenMeteoEndpoints,
    clock: Arc<dyn Clock>,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(endpoints: OpenMeteoEndpoints) -> Result<Self, SourceError> {
        Self::with_clock(endpoints, Arc::new(SystemClock))
    }

    pub fn with_clock(
        endpoints: OpenMeteoEndpoints,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SourceError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { endpoints, clock, http })
    }

    async fn fetch_plan(
        &self,
        coordinate: Coordinate,
        plan: &FetchPlan,
    ) -> Result<Vec<HourlyRecord>, SourceError> {
        let url = self.endpoints.url_for(plan.source);
        let hourly = plan.fields.join(",");
        let query = Query {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            start_date: plan.start,
            end_date: plan.end,
            hourly: &hourly,
            timezone: TIMEZONE,
        };

        let res = self.http.get(url).query(&query).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if status == StatusCode::BAD_REQUEST {
            warn!(
                source = %plan.source,
                reason = %error_reason(&body).unwrap_or_default(),
                "upstream rejected request, treating as no data"
            );
            return Ok(Vec::new());
        }

        if !status.is_success() {
            let reason = error_reason(&body).unwrap_or_else(|| {
                format!(
                    "Weather API Error: {}",
                    status.canonical_reason().unwrap_or("unknown status")
                )
            });
            return Err(SourceError::Upstream { kind: plan.source, status: status.as_u16(), reason });
        }

        let parsed: ApiResponse = serde_json::from_str(&body).map_err(|e| SourceError::Decode {
            kind: plan.source,
            message: e.to_string(),
        })?;

        let Some(hourly) = parsed.hourly else {
            return Ok(Vec::new());
        };

        let records = normalize(hourly).map_err(|message| SourceError::Decode {
            kind: plan.source,
            message,
        })?;
        debug!(source = %plan.source, count = records.len(), "normalized hourly records");
        Ok(records)
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn fetch_range(
        &self,
        coordinate: Coordinate,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HourlyRecord>, SourceError> {
        let today = self.clock.today();
        let Some(plan) = plan_fetch(start, end, today) else {
            debug!(%start, %today, "range starts past forecast horizon, skipping fetch");
            return Ok(Vec::new());
        };

        log_plan(&plan, coordinate);
        self.fetch_plan(coordinate, &plan).await
    }
}

#[derive(Serialize)]
struct Query<'a> {
    latitude: f64,
    longitude: f64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    hourly: &'a str,
    timezone: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    hourly: Option<HourlyBlock>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    reason: Option<String>,
}

type Series = Option<Vec<Option<f64>>>;

/// Parallel per-field arrays aligned with `time`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HourlyBlock {
    pub time: Option<Vec<String>>,
    pub temperature_2m: Series,
    pub apparent_temperature: Series,
    pub precipitation: Series,
    pub relative_humidity_2m: Series,
    pub surface_pressure: Series,
    pub visibility: Series,
    pub cloud_cover: Series,
    pub wind_speed_10m: Series,
    pub wind_direction_10m: Series,
    pub wind_gusts_10m: Series,
    pub snowfall: Series,
    pub snow_depth: Series,
    pub weather_code: Series,
    pub precipitation_probability: Series,
    pub uv_index: Series,
    pub cape: Series,
}

fn at(series: &Series, index: usize) -> Option<f64> {
    series.as_ref().and_then(|values| values.get(index).copied().flatten())
}

fn code_at(series: &Series, index: usize) -> Option<WeatherCode> {
    at(series, index)
        .filter(|code| (0.0..=f64::from(u8::MAX)).contains(code))
        .map(|code| WeatherCode(code as u8))
}

fn parse_time(raw: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| raw.parse::<NaiveDateTime>())
        .map_err(|e| format!("invalid timestamp '{raw}': {e}"))
}

/// Zip the parallel arrays into one record per timestamp.
///
/// A field that is missing, `null`, or shorter than `time` is absent for the
/// affected hours. Values are never shifted between indices.
pub fn normalize(block: HourlyBlock) -> Result<Vec<HourlyRecord>, String> {
    let Some(times) = block.time.as_ref() else {
        return Ok(Vec::new());
    };

    let records = times
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            Ok(HourlyRecord {
                time: parse_time(raw)?,
                temperature_2m: at(&block.temperature_2m, i),
                apparent_temperature: at(&block.apparent_temperature, i),
                precipitation: at(&block.precipitation, i),
                relative_humidity_2m: at(&block.relative_humidity_2m, i),
                surface_pressure: at(&block.surface_pressure, i),
                visibility: at(&block.visibility, i),
                cloud_cover: at(&block.cloud_cover, i),
                wind_speed_10m: at(&block.wind_speed_10m, i),
                wind_direction_10m: at(&block.wind_direction_10m, i),
                wind_gusts_10m: at(&block.wind_gusts_10m, i),
                snowfall: at(&block.snowfall, i),
                snow_depth: at(&block.snow_depth, i),
                weather_code: code_at(&block.weather_code, i),
                precipitation_probability: at(&block.precipitation_probability, i),
                uv_index: at(&block.uv_index, i),
                cape: at(&block.cape, i),
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    if let Some(pair) = records
        .windows(2)
        .find(|pair| pair[1].time - pair[0].time != TimeDelta::hours(1))
    {
        warn!(
            previous = %pair[0].time,
            next = %pair[1].time,
            "hourly sequence is not evenly spaced"
        );
    }

    Ok(records)
}

fn error_reason(body: &str) -> Option<String> {
    serde_json::from_str::<ApiError>(body).ok().and_then(|e| e.reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::FixedClock;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn provider_for(server: &MockServer, today: NaiveDate) -> OpenMeteoProvider {
        let endpoints = OpenMeteoEndpoints {
            forecast: format!("{}/v1/forecast", server.uri()),
            archive: format!("{}/v1/archive", server.uri()),
        };
        OpenMeteoProvider::with_clock(endpoints, Arc::new(FixedClock(today)))
            .expect("client should build")
    }

    fn block(json: serde_json::Value) -> HourlyBlock {
        serde_json::from_value(json).expect("valid hourly block")
    }

    #[test]
    fn normalize_zips_by_index() {
        let records = normalize(block(serde_json::json!({
            "time": ["2024-06-10T00:00", "2024-06-10T01:00"],
            "temperature_2m": [5.0, 6.0],
        })))
        .expect("normalize");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].time.to_string(), "2024-06-10 00:00:00");
        assert_eq!(records[0].temperature_2m, Some(5.0));
        assert_eq!(records[1].time.to_string(), "2024-06-10 01:00:00");
        assert_eq!(records[1].temperature_2m, Some(6.0));
    }

    #[test]
    fn normalize_marks_missing_fields_absent() {
        let records = normalize(block(serde_json::json!({
            "time": ["2024-06-10T00:00"],
            "temperature_2m": [5.0],
            "precipitation": [0.0],
        })))
        .expect("normalize");

        assert_eq!(records[0].uv_index, None);
        assert_eq!(records[0].cape, None);
        assert_eq!(records[0].precipitation_probability, None);
        assert_eq!(records[0].precipitation, Some(0.0));
    }

    #[test]
    fn normalize_keeps_nulls_and_short_arrays_in_place() {
        let records = normalize(block(serde_json::json!({
            "time": ["2024-06-10T00:00", "2024-06-10T01:00", "2024-06-10T02:00"],
            "temperature_2m": [5.0, null, 7.0],
            "uv_index": [1.5],
            "weather_code": [3, 61, 500],
        })))
        .expect("normalize");

        assert_eq!(records[1].temperature_2m, None);
        assert_eq!(records[2].temperature_2m, Some(7.0));
        assert_eq!(records[0].uv_index, Some(1.5));
        assert_eq!(records[1].uv_index, None);
        assert_eq!(records[1].weather_code, Some(WeatherCode(61)));
        assert_eq!(records[2].weather_code, None);
    }

    #[test]
    fn normalize_without_time_is_empty() {
        let records = normalize(block(serde_json::json!({ "temperature_2m": [1.0] })))
            .expect("normalize");
        assert!(records.is_empty());
    }

    #[test]
    fn normalize_rejects_bad_timestamp() {
        let err = normalize(block(serde_json::json!({ "time": ["yesterday"] }))).unwrap_err();
        assert!(err.contains("yesterday"));
    }

    #[tokio::test]
    async fn beyond_horizon_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let provider = provider_for(&server, date(2024, 6, 10));
        let records = provider
            .fetch_range(Coordinate::new(35.68, 139.69), date(2024, 7, 1), date(2024, 7, 7))
            .await
            .expect("fetch");
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn old_range_queries_archive_with_core_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/archive"))
            .and(query_param("start_date", "2024-05-26"))
            .and(query_param("end_date", "2024-06-01"))
            .and(query_param("timezone", "Asia/Tokyo"))
            .and(query_param("hourly", crate::provider::CORE_FIELDS.join(",")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hourly": {
                    "time": ["2024-05-26T00:00", "2024-05-26T01:00"],
                    "temperature_2m": [14.2, 13.8],
                    "weather_code": [1, 2],
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, date(2024, 6, 10));
        let records = provider
            .fetch_range(Coordinate::new(35.68, 139.69), date(2024, 5, 26), date(2024, 6, 1))
            .await
            .expect("fetch");

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].temperature_2m, Some(13.8));
        assert_eq!(records[0].uv_index, None);
    }

    #[tokio::test]
    async fn recent_range_queries_forecast_with_clamped_end() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("start_date", "2024-06-23"))
            .and(query_param("end_date", "2024-06-26"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hourly": {
                    "time": ["2024-06-23T00:00"],
                    "temperature_2m": [22.0],
                    "uv_index": [0.0],
                    "cape": [120.0],
                    "precipitation_probability": [40.0],
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, date(2024, 6, 10));
        let records = provider
            .fetch_range(Coordinate::new(35.68, 139.69), date(2024, 6, 23), date(2024, 6, 29))
            .await
            .expect("fetch");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].uv_index, Some(0.0));
        assert_eq!(records[0].cape, Some(120.0));
        assert_eq!(records[0].precipitation_probability, Some(40.0));
    }

    #[tokio::test]
    async fn bad_request_is_treated_as_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": true,
                "reason": "Parameter 'start_date' is out of allowed range",
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server, date(2024, 6, 10));
        let records = provider
            .fetch_range(Coordinate::new(35.68, 139.69), date(2024, 6, 9), date(2024, 6, 15))
            .await
            .expect("400 should not be an error");
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn server_error_carries_upstream_reason() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": true,
                "reason": "Too many concurrent requests",
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server, date(2024, 6, 10));
        let err = provider
            .fetch_range(Coordinate::new(35.68, 139.69), date(2024, 6, 9), date(2024, 6, 15))
            .await
            .unwrap_err();

        match err {
            SourceError::Upstream { kind, status, reason } => {
                assert_eq!(kind, DataSource::Forecast);
                assert_eq!(status, 503);
                assert_eq!(reason, "Too many concurrent requests");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_without_reason_uses_status_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&server)
            .await;

        let provider = provider_for(&server, date(2024, 6, 10));
        let err = provider
            .fetch_range(Coordinate::new(35.68, 139.69), date(2024, 5, 1), date(2024, 5, 4))
            .await
            .unwrap_err();
        assert!(err.user_message().contains("Internal Server Error"));
    }

    #[tokio::test]
    async fn response_without_hourly_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "latitude": 35.7,
                "longitude": 139.7,
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server, date(2024, 6, 10));
        let records = provider
            .fetch_range(Coordinate::new(35.68, 139.69), date(2024, 6, 9), date(2024, 6, 15))
            .await
            .expect("fetch");
        assert!(records.is_empty());
    }
}
