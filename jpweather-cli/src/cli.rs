use anyhow::{Context, Result, anyhow, bail};
use chrono::{Days, NaiveDate};
use clap::{Parser, Subcommand};
use inquire::{Password, Select, Text};
use serde_json::json;

use jpweather_core::{
    Config, Coordinate, Event, Location, Session,
    cities::{JAPANESE_CITIES, find_city},
    narrative::gemini::DEFAULT_MODEL,
    session::{AnalysisState, LoadState},
};

use crate::{app::App, explore, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "jpweather", version, about = "Japan weather archive explorer")]
pub struct Cli {
    /// Log request plans and upstream calls to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the Gemini API key, model and default city.
    Configure,

    /// List the selectable cities.
    Cities,

    /// Show the weather for one day and its surrounding week.
    Show {
        #[command(flatten)]
        target: Target,

        /// Also request an AI climate narrative for the day.
        #[arg(long)]
        analyze: bool,

        /// Print machine-readable JSON instead of tables.
        #[arg(long)]
        json: bool,
    },

    /// Browse interactively: change city, point or date, analyze, retry.
    Explore {
        #[command(flatten)]
        target: Target,
    },
}

#[derive(Debug, clap::Args)]
pub struct Target {
    /// City name, e.g. "Osaka" (see `jpweather cities`).
    #[arg(long, conflicts_with_all = ["lat", "lng"])]
    pub city: Option<String>,

    /// Latitude of an arbitrary point.
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude of an arbitrary point.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lng: Option<f64>,

    /// Date as YYYY-MM-DD; defaults to three days ago.
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

impl Target {
    fn location(&self, config: &Config) -> Result<Location> {
        if let (Some(lat), Some(lng)) = (self.lat, self.lng) {
            let coordinate = Coordinate::new(lat, lng);
            if !coordinate.is_valid() {
                bail!("Coordinates out of range: {lat}, {lng}");
            }
            return Ok(Location::resolve(coordinate));
        }

        match &self.city {
            Some(name) => find_city(name).map(|c| c.location()).ok_or_else(|| {
                anyhow!("Unknown city '{name}'.\nHint: run `jpweather cities` to list valid names.")
            }),
            None => Ok(config.default_city()?.location()),
        }
    }

    fn date(&self, today: NaiveDate) -> NaiveDate {
        self.date
            .or_else(|| today.checked_sub_days(Days::new(3)))
            .unwrap_or(today)
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Cities => {
                for (i, city) in JAPANESE_CITIES.iter().enumerate() {
                    println!(
                        "{:>2}  {:<12} {:<20} {:.4}, {:.4}",
                        i + 1,
                        city.name,
                        city.label,
                        city.coordinate.latitude,
                        city.coordinate.longitude
                    );
                }
                Ok(())
            }
            Command::Show { target, analyze, json } => {
                let config = Config::load()?;
                let app = App::from_config(&config)?;
                if analyze && !app.can_narrate() {
                    bail!(
                        "No Gemini API key configured.\n\
                         Hint: run `jpweather configure` or set GEMINI_API_KEY."
                    );
                }
                show(&app, target.location(&config)?, target.date(app.today()), analyze, json)
                    .await
            }
            Command::Explore { target } => {
                let config = Config::load()?;
                let app = App::from_config(&config)?;
                let location = target.location(&config)?;
                let date = target.date(app.today());
                explore::run(&app, location, date).await
            }
        }
    }
}

async fn show(
    app: &App,
    location: Location,
    date: NaiveDate,
    analyze: bool,
    json: bool,
) -> Result<()> {
    let (session, effect) = Session::start(location, date);
    let mut session = app.settle(session, Some(effect)).await;

    if analyze && session.can_analyze() {
        let (next, effect) = session.update(Event::AnalyzeRequested);
        session = app.settle(next, effect).await;
    }

    let today = app.today();
    if json {
        let narrative = match session.analysis_state() {
            AnalysisState::Succeeded(text) | AnalysisState::Failed(text) => Some(text.as_str()),
            AnalysisState::Idle | AnalysisState::Analyzing => None,
        };
        let error = match session.load_state() {
            LoadState::Failed(message) => Some(message.as_str()),
            _ => None,
        };
        let value = json!({
            "location": session.location(),
            "date": session.date(),
            "horizon": session.horizon(today),
            "error": error,
            "summary": session.selected_day_summary(),
            "daily": session.daily_summaries(),
            "hourly": session.hourly_for_selected_day(),
            "analysis": narrative,
        });
        let text = serde_json::to_string_pretty(&value).context("Failed to serialize output")?;
        println!("{text}");
    } else {
        print!("{}", render::session_view(&session, today));
    }

    if let LoadState::Failed(message) = session.load_state() {
        bail!("Failed to load weather data: {message}");
    }
    Ok(())
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("Gemini API key (leave empty to keep current):")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        config.set_gemini_api_key(api_key.trim().to_string());
    }

    let model = Text::new("Gemini model:")
        .with_default(config.gemini.model.as_deref().unwrap_or(DEFAULT_MODEL))
        .prompt()
        .context("Failed to read model name")?;
    config.gemini.model = Some(model.trim().to_string());

    let labels: Vec<&str> = JAPANESE_CITIES.iter().map(|c| c.label).collect();
    let start = JAPANESE_CITIES
        .iter()
        .position(|c| Some(c.name) == config.default_city().ok().map(|d| d.name))
        .unwrap_or(0);
    let label = Select::new("Default city:", labels)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read default city")?;
    if let Some(city) = find_city(label) {
        config.set_default_city(city);
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_show_with_city_and_date() {
        let cli = Cli::try_parse_from([
            "jpweather", "show", "--city", "Osaka", "--date", "2024-06-10", "--analyze",
        ])
        .expect("parse");
        match cli.command {
            Command::Show { target, analyze, json } => {
                assert_eq!(target.city.as_deref(), Some("Osaka"));
                assert_eq!(target.date, NaiveDate::from_ymd_opt(2024, 6, 10));
                assert!(analyze);
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn city_conflicts_with_coordinates() {
        let res = Cli::try_parse_from([
            "jpweather", "show", "--city", "Osaka", "--lat", "35.0", "--lng", "135.0",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn lat_requires_lng() {
        assert!(Cli::try_parse_from(["jpweather", "show", "--lat", "35.0"]).is_err());
    }

    #[test]
    fn target_resolves_location_and_default_date() {
        let target = Target { city: None, lat: Some(34.70), lng: Some(135.50), date: None };
        let location = target.location(&Config::default()).expect("location");
        assert_eq!(location.name, "Osaka");

        let today = NaiveDate::from_ymd_opt(2024, 6, 10).expect("valid date");
        assert_eq!(target.date(today), NaiveDate::from_ymd_opt(2024, 6, 7).expect("valid date"));
    }

    #[test]
    fn target_rejects_unknown_city_and_bad_coordinates() {
        let unknown = Target { city: Some("Gotham".into()), lat: None, lng: None, date: None };
        assert!(unknown.location(&Config::default()).is_err());

        let bad = Target { city: None, lat: Some(123.0), lng: Some(0.0), date: None };
        assert!(bad.location(&Config::default()).is_err());
    }

    #[test]
    fn target_defaults_to_configured_city() {
        let target = Target { city: None, lat: None, lng: None, date: None };
        let location = target.location(&Config::default()).expect("location");
        assert_eq!(location.name, "Tokyo");
    }
}
