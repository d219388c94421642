//! Dashboard session state and its transition function.
//!
//! All changes go through [`Session::update`], which returns the next state and
//! at most one effect for the caller to run. Effects carry a token; a
//! completion whose token is not the latest issued one is dropped, so a slow
//! stale response can never overwrite newer data.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::{
    aggregate::{daily_summaries, filter_for_day, summarize},
    cities::find_city,
    dates::{HorizonStatus, week_range},
    model::{AnalysisRequest, AnalysisResult, Coordinate, DailySummary, HourlyRecord, Location},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestToken(u64);

impl RequestToken {
    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisState {
    Idle,
    Analyzing,
    Succeeded(String),
    Failed(String),
}

#[derive(Debug, Clone)]
pub enum Event {
    SelectCity(String),
    PickPoint(Coordinate),
    SelectDate(NaiveDate),
    Retry,
    FetchCompleted {
        token: RequestToken,
        result: Result<Vec<HourlyRecord>, String>,
    },
    AnalyzeRequested,
    AnalysisCompleted {
        token: RequestToken,
        result: AnalysisResult,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch {
        token: RequestToken,
        coordinate: Coordinate,
        start: NaiveDate,
        end: NaiveDate,
    },
    Analyze {
        token: RequestToken,
        request: AnalysisRequest,
    },
}

#[derive(Debug, Clone)]
pub struct Session {
    location: Location,
    date: NaiveDate,
    records: Vec<HourlyRecord>,
    load: LoadState,
    analysis: AnalysisState,
    fetch_token: RequestToken,
    analysis_token: RequestToken,
}

impl Session {
    pub fn new(location: Location, date: NaiveDate) -> Self {
        Self {
            location,
            date,
            records: Vec::new(),
            load: LoadState::Idle,
            analysis: AnalysisState::Idle,
            fetch_token: RequestToken::default(),
            analysis_token: RequestToken::default(),
        }
    }

    /// New session plus the fetch for its initial week.
    pub fn start(location: Location, date: NaiveDate) -> (Self, Effect) {
        Self::new(location, date).begin_fetch()
    }

    pub fn update(self, event: Event) -> (Self, Option<Effect>) {
        match event {
            Event::SelectCity(name) => match find_city(&name) {
                Some(city) if city.coordinate != self.location.coordinate => {
                    self.relocate(city.location())
                }
                Some(_) => (self, None),
                None => {
                    warn!(%name, "unknown city, ignoring selection");
                    (self, None)
                }
            },
            Event::PickPoint(coordinate) => {
                if coordinate == self.location.coordinate {
                    return (self, None);
                }
                self.relocate(Location::resolve(coordinate))
            }
            Event::SelectDate(date) => {
                if date == self.date {
                    return (self, None);
                }
                let (next, effect) = Self { date, ..self }.begin_fetch();
                (next, Some(effect))
            }
            Event::Retry => {
                let (next, effect) = self.begin_fetch();
                (next, Some(effect))
            }
            Event::FetchCompleted { token, result } => {
                if token != self.fetch_token {
                    debug!(?token, latest = ?self.fetch_token, "discarding stale fetch result");
                    return (self, None);
                }
                let next = match result {
                    Ok(records) => Self { records, load: LoadState::Loaded, ..self },
                    Err(message) => {
                        Self { records: Vec::new(), load: LoadState::Failed(message), ..self }
                    }
                };
                (next, None)
            }
            Event::AnalyzeRequested => {
                if !self.can_analyze() {
                    return (self, None);
                }
                let token = self.analysis_token.next();
                let request = AnalysisRequest {
                    location: self.location.clone(),
                    date: self.date,
                    records: self.hourly_for_selected_day(),
                };
                let next = Self { analysis: AnalysisState::Analyzing, analysis_token: token, ..self };
                (next, Some(Effect::Analyze { token, request }))
            }
            Event::AnalysisCompleted { token, result } => {
                if token != self.analysis_token || self.analysis != AnalysisState::Analyzing {
                    debug!(?token, latest = ?self.analysis_token, "discarding stale analysis");
                    return (self, None);
                }
                let analysis = match result {
                    AnalysisResult::Narrative(text) => AnalysisState::Succeeded(text),
                    fallback @ AnalysisResult::Fallback(_) => {
                        AnalysisState::Failed(fallback.text().to_string())
                    }
                };
                (Self { analysis, ..self }, None)
            }
        }
    }

    fn relocate(self, location: Location) -> (Self, Option<Effect>) {
        let (next, effect) = Self { location, ..self }.begin_fetch();
        (next, Some(effect))
    }

    fn begin_fetch(self) -> (Self, Effect) {
        let token = self.fetch_token.next();
        let (start, end) = week_range(self.date);
        let effect = Effect::Fetch { token, coordinate: self.location.coordinate, start, end };
        let next = Self {
            records: Vec::new(),
            load: LoadState::Loading,
            analysis: AnalysisState::Idle,
            fetch_token: token,
            // Any analysis still in flight belongs to the old selection.
            analysis_token: self.analysis_token.next(),
            ..self
        };
        (next, effect)
    }

    /// The analyze trigger is enabled only for a loaded day with data.
    pub fn can_analyze(&self) -> bool {
        self.load == LoadState::Loaded
            && self.analysis != AnalysisState::Analyzing
            && self.records.iter().any(|r| r.date() == self.date)
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn records(&self) -> &[HourlyRecord] {
        &self.records
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn analysis_state(&self) -> &AnalysisState {
        &self.analysis
    }

    pub fn daily_summaries(&self) -> Vec<DailySummary> {
        daily_summaries(&self.records)
    }

    pub fn hourly_for_selected_day(&self) -> Vec<HourlyRecord> {
        filter_for_day(&self.records, self.date)
    }

    pub fn selected_day_summary(&self) -> Option<DailySummary> {
        summarize(&self.hourly_for_selected_day())
    }

    pub fn horizon(&self, today: NaiveDate) -> HorizonStatus {
        HorizonStatus::classify(self.date, today)
    }
}
