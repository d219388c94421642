//! Core library for the `jpweather` CLI.
//!
//! This crate defines:
//! - Date-range helpers and the forecast-horizon rules
//! - Hourly weather acquisition from the Open-Meteo forecast/archive sources
//! - Daily aggregation of the hourly series
//! - Climate-insight narratives from a generative-text service
//! - The session state reducer that ties them together
//! - Configuration & credentials handling
//!
//! It is used by `jpweather-cli`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod cities;
pub mod config;
pub mod dates;
pub mod error;
pub mod model;
pub mod narrative;
pub mod provider;
pub mod session;

pub use config::Config;
pub use error::SourceError;
pub use model::{
    AnalysisRequest, AnalysisResult, Coordinate, DailySummary, Fallback, HourlyRecord, Location,
    WeatherCode,
};
pub use narrative::{NarrativeService, TextGenerator};
pub use provider::{DataSource, WeatherProvider};
pub use session::{Effect, Event, Session};
