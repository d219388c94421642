use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{
    cities::{City, default_city, find_city},
    narrative::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL},
    provider::open_meteo::{DEFAULT_ARCHIVE_URL, DEFAULT_FORECAST_URL, OpenMeteoEndpoints},
};

/// Environment variables checked, in order, for a Gemini API key.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Credentials and model for the narrative service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
}

/// Base URLs of the upstream services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub forecast: String,
    pub archive: String,
    pub gemini: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            forecast: DEFAULT_FORECAST_URL.to_string(),
            archive: DEFAULT_ARCHIVE_URL.to_string(),
            gemini: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl EndpointsConfig {
    pub fn open_meteo(&self) -> OpenMeteoEndpoints {
        OpenMeteoEndpoints { forecast: self.forecast.clone(), archive: self.archive.clone() }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Romanized name of the city selected at startup, e.g. "Osaka".
    pub default_city: Option<String>,

    /// Example TOML:
    /// [gemini]
    /// api_key = "..."
    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

impl Config {
    /// The configured startup city, Tokyo when unset.
    pub fn default_city(&self) -> Result<&'static City> {
        match self.default_city.as_deref() {
            None => Ok(default_city()),
            Some(name) => find_city(name).ok_or_else(|| {
                anyhow!(
                    "Unknown default city '{name}' in config.\n\
                     Hint: run `jpweather cities` to list valid names."
                )
            }),
        }
    }

    pub fn set_default_city(&mut self, city: &City) {
        self.default_city = Some(city.name.to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "jpweather", "jpweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_gemini_api_key(&mut self, api_key: String) {
        self.gemini.api_key = Some(api_key);
    }

    /// API key from the environment, falling back to the config file.
    pub fn gemini_api_key(&self) -> Option<String> {
        self.gemini_api_key_with(|name| std::env::var(name).ok())
    }

    fn gemini_api_key_with(&self, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| env(name))
            .chain(self.gemini.api_key.clone())
            .find(|key| !key.trim().is_empty())
    }

    pub fn gemini_model(&self) -> &str {
        self.gemini.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn is_gemini_configured(&self) -> bool {
        self.gemini_api_key().is_some()
    }
}
