//! Startup configuration
//!
//! Everything is read once, at startup, into plain structs that are then
//! handed to the clients that need them. Secrets never go through `Debug`.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::llm::core::config::GenerationConfig;
use crate::llm::gemini::GeminiModel;
use crate::llm::orchestrator::DispatchMode;

pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const GEMINI_MODEL: &str = "GEMINI_MODEL";
pub const GEMINI_API_ENDPOINT: &str = "GEMINI_API_ENDPOINT";
pub const GEMINI_MAX_OUTPUT_TOKENS: &str = "GEMINI_MAX_OUTPUT_TOKENS";
pub const GEMINI_TEMPERATURE: &str = "GEMINI_TEMPERATURE";
pub const WEATHER_API_KEY: &str = "WEATHER_API_KEY";
/// Older `.env` files used this lowercase name
pub const LEGACY_WEATHER_API_KEY: &str = "weather_api";
pub const WEATHER_API_ENDPOINT: &str = "WEATHER_API_ENDPOINT";
pub const WEATHER_TIMEOUT_SECS: &str = "WEATHER_TIMEOUT_SECS";
pub const AGENT_SUMMARIZE_TOOL_RESULTS: &str = "AGENT_SUMMARIZE_TOOL_RESULTS";

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_WEATHER_ENDPOINT: &str = "http://api.weatherapi.com/v1";
pub const DEFAULT_WEATHER_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. When the user asks about \
current weather, air quality, or a forecast for a place, call the matching tool with the place \
exactly as the user wrote it. Otherwise answer directly.";

/// Configuration errors; all of them are fatal at startup
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: GeminiModel,
    pub endpoint: String,
    pub request_timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: GeminiModel::default(),
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            request_timeout: DEFAULT_MODEL_TIMEOUT,
        }
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Clone)]
pub struct WeatherConfig {
    pub api_key: String,
    /// Base URL; `current.json` and `forecast.json` are appended
    pub endpoint: String,
    pub timeout: Duration,
}

impl WeatherConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_WEATHER_ENDPOINT.to_string(),
            timeout: DEFAULT_WEATHER_TIMEOUT,
        }
    }
}

impl fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Behaviour of the conversation loop
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub system_prompt: Option<String>,
    pub dispatch_mode: DispatchMode,
    /// Model calls allowed per prompt in [`DispatchMode::Summarize`]
    pub max_iterations: usize,
    pub generation: GenerationConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            dispatch_mode: DispatchMode::Raw,
            max_iterations: 5,
            generation: GenerationConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub weather: WeatherConfig,
    pub agent: AgentConfig,
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let gemini_key = get(GEMINI_API_KEY).ok_or(ConfigError::MissingVar(GEMINI_API_KEY))?;
        let weather_key = get(WEATHER_API_KEY)
            .or_else(|| get(LEGACY_WEATHER_API_KEY))
            .ok_or(ConfigError::MissingVar(WEATHER_API_KEY))?;

        let mut gemini = GeminiConfig::new(gemini_key);
        if let Some(model) = get(GEMINI_MODEL) {
            gemini.model = model.parse().unwrap_or_default();
        }
        if let Some(endpoint) = get(GEMINI_API_ENDPOINT) {
            gemini.endpoint = endpoint;
        }

        let mut weather = WeatherConfig::new(weather_key);
        if let Some(endpoint) = get(WEATHER_API_ENDPOINT) {
            weather.endpoint = endpoint;
        }
        if let Some(raw) = get(WEATHER_TIMEOUT_SECS) {
            weather.timeout = parse_timeout(WEATHER_TIMEOUT_SECS, &raw)?;
        }

        let mut agent = AgentConfig::default();
        if let Some(raw) = get(GEMINI_MAX_OUTPUT_TOKENS) {
            agent.generation = agent
                .generation
                .with_max_output_tokens(parse_max_tokens(GEMINI_MAX_OUTPUT_TOKENS, &raw)?);
        }
        if let Some(raw) = get(GEMINI_TEMPERATURE) {
            agent.generation = agent
                .generation
                .with_temperature(parse_temperature(GEMINI_TEMPERATURE, &raw)?);
        }
        if let Some(raw) = get(AGENT_SUMMARIZE_TOOL_RESULTS) {
            if parse_flag(AGENT_SUMMARIZE_TOOL_RESULTS, &raw)? {
                agent.dispatch_mode = DispatchMode::Summarize;
            }
        }

        Ok(Self {
            gemini,
            weather,
            agent,
        })
    }
}

fn parse_timeout(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidValue {
            name,
            reason: format!("expected a positive number of seconds, got '{}'", raw),
        }),
    }
}

fn parse_max_tokens(name: &'static str, raw: &str) -> Result<u32, ConfigError> {
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue {
            name,
            reason: format!("expected a positive token count, got '{}'", raw),
        }),
    }
}

/// Gemini accepts temperatures in [0.0, 2.0]
fn parse_temperature(name: &'static str, raw: &str) -> Result<f32, ConfigError> {
    match raw.parse::<f32>() {
        Ok(t) if (0.0..=2.0).contains(&t) => Ok(t),
        _ => Err(ConfigError::InvalidValue {
            name,
            reason: format!("expected a number between 0 and 2, got '{}'", raw),
        }),
    }
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            reason: format!("expected true or false, got '{}'", raw),
        }),
    }
}
