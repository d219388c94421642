use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::warn;

use jpweather_core::{
    AnalysisResult, Config, Effect, Event, Fallback, NarrativeService, Session, WeatherProvider,
    narrative::GeminiGenerator,
    provider::{Clock, OpenMeteoProvider, SystemClock},
};

/// Clients built from the configuration, and the loop that runs session effects.
#[derive(Debug)]
pub struct App {
    provider: Box<dyn WeatherProvider>,
    narrator: Option<NarrativeService>,
    clock: Arc<dyn Clock>,
}

impl App {
    pub fn from_config(config: &Config) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let provider = OpenMeteoProvider::with_clock(config.endpoints.open_meteo(), clock.clone())?;

        let narrator = match config.gemini_api_key() {
            Some(api_key) => {
                let generator = GeminiGenerator::new(
                    api_key,
                    config.gemini_model().to_string(),
                    config.endpoints.gemini.clone(),
                )?;
                Some(NarrativeService::new(Arc::new(generator)))
            }
            None => None,
        };

        Ok(Self { provider: Box::new(provider), narrator, clock })
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn can_narrate(&self) -> bool {
        self.narrator.is_some()
    }

    pub async fn run_effect(&self, effect: Effect) -> Event {
        match effect {
            Effect::Fetch { token, coordinate, start, end } => {
                let result = self
                    .provider
                    .fetch_range(coordinate, start, end)
                    .await
                    .map_err(|e| {
                        warn!(error = %e, "weather fetch failed");
                        e.user_message()
                    });
                Event::FetchCompleted { token, result }
            }
            Effect::Analyze { token, request } => {
                let result = match &self.narrator {
                    Some(narrator) => narrator.narrate(&request).await,
                    None => {
                        warn!("no Gemini API key configured, skipping narrative");
                        AnalysisResult::Fallback(Fallback::GenerationFailed)
                    }
                };
                Event::AnalysisCompleted { token, result }
            }
        }
    }

    /// Run effects until the session stops asking for more.
    pub async fn settle(&self, session: Session, effect: Option<Effect>) -> Session {
        let (mut session, mut pending) = (session, effect);
        while let Some(effect) = pending.take() {
            let event = self.run_effect(effect).await;
            (session, pending) = session.update(event);
        }
        session
    }
}
