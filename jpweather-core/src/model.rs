use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// True when both axes are within `tolerance` degrees.
    pub fn is_near(&self, other: &Coordinate, tolerance: f64) -> bool {
        (self.latitude - other.latitude).abs() < tolerance
            && (self.longitude - other.longitude).abs() < tolerance
    }

    /// Latitude within ±90 and longitude within ±180.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// A named place, or an arbitrary picked point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub label: String,
    pub coordinate: Coordinate,
}

impl Location {
    pub const CUSTOM_NAME: &'static str = "Custom";

    pub fn custom(coordinate: Coordinate) -> Self {
        Self {
            name: Self::CUSTOM_NAME.to_string(),
            label: format!(
                "指定地点 ({:.2}, {:.2})",
                coordinate.latitude, coordinate.longitude
            ),
            coordinate,
        }
    }

    pub fn is_custom(&self) -> bool {
        self.name == Self::CUSTOM_NAME
    }
}

/// One hour of weather. `None` marks a field the source did not supply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRecord {
    pub time: NaiveDateTime,
    pub temperature_2m: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub precipitation: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
    pub surface_pressure: Option<f64>,
    pub visibility: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub wind_speed_10m: Option<f64>,
    pub wind_direction_10m: Option<f64>,
    pub wind_gusts_10m: Option<f64>,
    pub snowfall: Option<f64>,
    pub snow_depth: Option<f64>,
    pub weather_code: Option<WeatherCode>,
    pub precipitation_probability: Option<f64>,
    pub uv_index: Option<f64>,
    pub cape: Option<f64>,
}

impl HourlyRecord {
    /// A record with every measurement absent.
    pub fn empty(time: NaiveDateTime) -> Self {
        Self {
            time,
            temperature_2m: None,
            apparent_temperature: None,
            precipitation: None,
            relative_humidity_2m: None,
            surface_pressure: None,
            visibility: None,
            cloud_cover: None,
            wind_speed_10m: None,
            wind_direction_10m: None,
            wind_gusts_10m: None,
            snowfall: None,
            snow_depth: None,
            weather_code: None,
            precipitation_probability: None,
            uv_index: None,
            cape: None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.time.date()
    }
}

/// WMO weather interpretation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherCode(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Clear,
    Cloudy,
    Fog,
    Rain,
    Snow,
    Showers,
    Thunderstorm,
    Other,
}

impl WeatherCode {
    pub fn condition(self) -> Condition {
        match self.0 {
            0 | 1 => Condition::Clear,
            2 | 3 => Condition::Cloudy,
            45 | 48 => Condition::Fog,
            51..=67 => Condition::Rain,
            71..=77 | 85 | 86 => Condition::Snow,
            80..=82 => Condition::Showers,
            95..=99 => Condition::Thunderstorm,
            _ => Condition::Other,
        }
    }

    /// Japanese label shown under the condition icon.
    pub fn label(self) -> &'static str {
        match self.0 {
            0 => "快晴",
            1..=3 => "曇り",
            51..=67 => "雨",
            71..=77 => "雪",
            80..=82 => "にわか雨",
            _ => "その他",
        }
    }
}

impl std::fmt::Display for WeatherCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub max_temp: f64,
    pub min_temp: f64,
    pub precipitation: f64,
    pub condition: Option<WeatherCode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub location: Location,
    pub date: NaiveDate,
    pub records: Vec<HourlyRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    NoData,
    GenerationFailed,
    EmptyResponse,
}

impl Fallback {
    pub fn message(self) -> &'static str {
        match self {
            Fallback::NoData => {
                "分析できる気象データがありません。日付や地点を変更してお試しください。"
            }
            Fallback::GenerationFailed => {
                "AIによる分析中にエラーが発生しました。しばらく経ってから再度お試しください。"
            }
            Fallback::EmptyResponse => "AI分析の生成に失敗しました。",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisResult {
    Narrative(String),
    Fallback(Fallback),
}

impl AnalysisResult {
    pub fn text(&self) -> &str {
        match self {
            AnalysisResult::Narrative(text) => text,
            AnalysisResult::Fallback(fallback) => fallback.message(),
        }
    }

    pub fn is_narrative(&self) -> bool {
        matches!(self, AnalysisResult::Narrative(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_range_check() {
        assert!(Coordinate::new(35.68, 139.69).is_valid());
        assert!(Coordinate::new(-90.0, 180.0).is_valid());
        assert!(!Coordinate::new(91.0, 139.0).is_valid());
        assert!(!Coordinate::new(35.0, -180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn weather_code_labels_follow_wmo_groups() {
        assert_eq!(WeatherCode(0).label(), "快晴");
        assert_eq!(WeatherCode(2).label(), "曇り");
        assert_eq!(WeatherCode(61).label(), "雨");
        assert_eq!(WeatherCode(73).label(), "雪");
        assert_eq!(WeatherCode(81).label(), "にわか雨");
        assert_eq!(WeatherCode(95).label(), "その他");
    }

    #[test]
    fn weather_code_conditions() {
        assert_eq!(WeatherCode(1).condition(), Condition::Clear);
        assert_eq!(WeatherCode(48).condition(), Condition::Fog);
        assert_eq!(WeatherCode(86).condition(), Condition::Snow);
        assert_eq!(WeatherCode(96).condition(), Condition::Thunderstorm);
    }

    #[test]
    fn custom_location_label_uses_two_decimals() {
        let loc = Location::custom(Coordinate::new(35.12345, 139.98765));
        assert!(loc.is_custom());
        assert_eq!(loc.label, "指定地点 (35.12, 139.99)");
    }

    #[test]
    fn fallback_messages_are_distinct() {
        assert_ne!(Fallback::NoData.message(), Fallback::GenerationFailed.message());
        assert_ne!(Fallback::GenerationFailed.message(), Fallback::EmptyResponse.message());
        let result = AnalysisResult::Fallback(Fallback::NoData);
        assert_eq!(result.text(), Fallback::NoData.message());
        assert!(!result.is_narrative());
    }
}
