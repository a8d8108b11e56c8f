//! Weather tools exposed to the model

use std::sync::Arc;

use serde::Deserialize;

use crate::llm::tools::{ParameterKind, ParameterSpec, RegistryError, ToolDeclaration, ToolRegistry};

use super::client::{WeatherClient, WeatherQuery};

pub const CURRENT_WEATHER_TOOL: &str = "get_current_weather";
pub const AIR_QUALITY_TOOL: &str = "get_air_quality";
pub const FORECAST_TOOL: &str = "get_weather_forecast";

#[derive(Debug, Deserialize)]
struct LocationArgs {
    location: String,
}

#[derive(Debug, Deserialize)]
struct ForecastArgs {
    location: String,
    days: Option<i64>,
}

fn location_param() -> ParameterSpec {
    ParameterSpec::required(
        "location",
        ParameterKind::String,
        "City or place name, postcode, or 'latitude,longitude' coordinates, e.g. 'Paris' or '48.85,2.35'.",
    )
}

pub fn current_weather_declaration() -> ToolDeclaration {
    ToolDeclaration::new(
        CURRENT_WEATHER_TOOL,
        "Get the current weather conditions (temperature, wind, humidity, condition text) for a location.",
    )
    .with_parameter(location_param())
}

pub fn air_quality_declaration() -> ToolDeclaration {
    ToolDeclaration::new(
        AIR_QUALITY_TOOL,
        "Get the current weather together with air quality readings (PM2.5, PM10, ozone, AQI indices) for a location.",
    )
    .with_parameter(location_param())
}

pub fn forecast_declaration() -> ToolDeclaration {
    ToolDeclaration::new(
        FORECAST_TOOL,
        "Get the weather forecast for a location, including air quality and any active weather alerts.",
    )
    .with_parameter(location_param())
    .with_parameter(
        ParameterSpec::optional(
            "days",
            ParameterKind::Integer,
            "Number of days to forecast. Defaults to 1.",
        )
        .with_default(1),
    )
}

/// Register the weather tools, in the order they are advertised
pub fn register_weather_tools(
    registry: &mut ToolRegistry,
    client: Arc<WeatherClient>,
) -> Result<(), RegistryError> {
    let current = Arc::clone(&client);
    registry.register_async(current_weather_declaration(), move |args: LocationArgs| {
        let client = Arc::clone(&current);
        async move {
            client
                .fetch(WeatherQuery::Current, &args.location, None)
                .await
                .into_tool_result()
        }
    })?;

    let air = Arc::clone(&client);
    registry.register_async(air_quality_declaration(), move |args: LocationArgs| {
        let client = Arc::clone(&air);
        async move {
            client
                .fetch(WeatherQuery::CurrentWithAqi, &args.location, None)
                .await
                .into_tool_result()
        }
    })?;

    registry.register_async(forecast_declaration(), move |args: ForecastArgs| {
        let client = Arc::clone(&client);
        async move {
            client
                .fetch(WeatherQuery::Forecast, &args.location, args.days)
                .await
                .into_tool_result()
        }
    })?;

    Ok(())
}
