//! Climate-insight narratives from a generative-text service.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use std::{fmt::Debug, sync::Arc};
use tracing::{debug, error};

use crate::{
    aggregate::DayStatistics,
    model::{AnalysisRequest, AnalysisResult, Fallback, Location},
};

pub mod gemini;

pub use gemini::GeminiGenerator;

/// Sampling settings passed to the generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
}

impl GenerationConfig {
    pub fn new(temperature: f32, top_p: f32) -> Self {
        Self {
            temperature: temperature.clamp(0.0, 2.0),
            top_p: top_p.clamp(0.0, 1.0),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(0.7, 0.95)
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync + Debug {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> anyhow::Result<String>;
}

#[derive(Debug, Serialize)]
struct PromptPayload<'a> {
    location: &'a str,
    latitude: f64,
    longitude: f64,
    date: NaiveDate,
    statistics: &'a DayStatistics,
}

/// Embed the statistics for `date` at `location` in the instruction template.
pub fn build_prompt(location: &Location, date: NaiveDate, stats: &DayStatistics) -> String {
    let payload = PromptPayload {
        location: &location.label,
        latitude: location.coordinate.latitude,
        longitude: location.coordinate.longitude,
        date,
        statistics: stats,
    };
    let payload = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| "{}".to_string());

    format!(
        "以下の日本の地点の気象データについて、分かりやすく親しみやすい日本語で分析してください。\n\
         \n\
         地点: {label} ({name})\n\
         日付: {date}\n\
         \n\
         統計データ (JSON、値が null の項目はデータなし):\n\
         {payload}\n\
         \n\
         分析のポイント:\n\
         1. この時期の平年値と比較してどのような特徴があるか(推測で構いません)。\n\
         2. この日の天気が人々の生活や服装にどのような影響を与えたと考えられるか。\n\
         3. 湿度・気圧・風・雲量などから読み取れる空模様の変化。\n\
         4. この地域ならではの気候特性についての豆知識。\n\
         \n\
         回答は簡潔に、かつ興味深い内容にしてください。",
        label = location.label,
        name = location.name,
    )
}

#[derive(Debug, Clone)]
pub struct NarrativeService {
    generator: Arc<dyn TextGenerator>,
    config: GenerationConfig,
}

impl NarrativeService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator, config: GenerationConfig::default() }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// Never fails: every problem is downgraded to a fallback message.
    pub async fn narrate(&self, request: &AnalysisRequest) -> AnalysisResult {
        if request.records.is_empty() {
            return AnalysisResult::Fallback(Fallback::NoData);
        }

        let stats = DayStatistics::from_records(&request.records);
        let prompt = build_prompt(&request.location, request.date, &stats);
        debug!(location = %request.location.name, date = %request.date, "requesting narrative");

        match self.generator.generate(&prompt, &self.config).await {
            Ok(text) if text.trim().is_empty() => AnalysisResult::Fallback(Fallback::EmptyResponse),
            Ok(text) => AnalysisResult::Narrative(text),
            Err(e) => {
                error!(error = %format!("{e:#}"), "narrative generation failed");
                AnalysisResult::Fallback(Fallback::GenerationFailed)
            }
        }
    }
}
