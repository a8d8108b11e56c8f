//! Weather data fetching and the tools built on it

pub mod client;
pub mod outcome;
pub mod tools;

pub use client::{WeatherClient, WeatherQuery, FORECAST_WINDOW_DAYS};
pub use outcome::{FailureKind, FetchFailure, FetchOutcome};
pub use tools::{register_weather_tools, AIR_QUALITY_TOOL, CURRENT_WEATHER_TOOL, FORECAST_TOOL};
