//! Weather provider client
//!
//! Each call issues exactly one GET request with a bounded timeout. Nothing
//! is retried or cached, and no failure escapes as an error: every outcome is
//! logged and folded into a [`FetchOutcome`].

use reqwest::{Client, StatusCode};
use tracing::{debug, error, info};

use crate::config::WeatherConfig;

use super::outcome::{FailureKind, FetchOutcome};

/// Day count always requested from the forecast endpoint.
///
/// The forecast tool accepts a `days` argument but the provider is always
/// asked for this fixed window; the requested count is only logged.
pub const FORECAST_WINDOW_DAYS: u32 = 3;

/// The three query shapes the provider supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherQuery {
    /// Current conditions without air quality
    Current,
    /// Current conditions plus air quality
    CurrentWithAqi,
    /// Forecast with air quality and alerts
    Forecast,
}

impl WeatherQuery {
    fn path(&self) -> &'static str {
        match self {
            WeatherQuery::Current | WeatherQuery::CurrentWithAqi => "current.json",
            WeatherQuery::Forecast => "forecast.json",
        }
    }
}

/// Normalize a caller-supplied day count: absent or non-positive means 1
fn normalize_days(days: Option<i64>) -> u32 {
    days.filter(|d| *d > 0)
        .map(|d| d.min(i64::from(u32::MAX)) as u32)
        .unwrap_or(1)
}

/// Client for the weatherapi.com-style HTTP API
pub struct WeatherClient {
    http_client: Client,
    api_key: String,
    endpoint: String,
}

impl WeatherClient {
    /// Build a client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (TLS backend setup).
    pub fn new(config: &WeatherConfig) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch one document from the provider
    ///
    /// `location` is forwarded verbatim. `days` is only meaningful for
    /// [`WeatherQuery::Forecast`]; see [`FORECAST_WINDOW_DAYS`].
    pub async fn fetch(&self, query: WeatherQuery, location: &str, days: Option<i64>) -> FetchOutcome {
        let url = format!("{}/{}", self.endpoint, query.path());
        let params = self.query_params(query, location, days);

        let response = match self.http_client.get(&url).query(&params).send().await {
            Ok(response) => response,
            Err(e) => {
                let kind = classify(&e);
                // The query string carries the API key; keep it out of logs
                return failed(&url, kind, e.without_url().to_string(), None);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = provider_message(&body).unwrap_or_else(|| status.to_string());
            if status == StatusCode::BAD_REQUEST {
                error!(endpoint = %url, "Bad request. Please check the location provided.");
                return failed(
                    &url,
                    FailureKind::BadRequest,
                    format!("{} Please check the location provided.", detail),
                    Some(status.as_u16()),
                );
            }
            return failed(
                &url,
                FailureKind::OtherRequestError,
                format!("HTTP {}: {}", status.as_u16(), detail),
                Some(status.as_u16()),
            );
        }

        match response.json::<serde_json::Value>().await {
            Ok(payload) => {
                info!(endpoint = %url, status = status.as_u16(), "Weather request succeeded");
                FetchOutcome::Success(payload)
            }
            Err(e) => {
                let kind = classify(&e);
                failed(&url, kind, e.without_url().to_string(), Some(status.as_u16()))
            }
        }
    }

    fn query_params(&self, query: WeatherQuery, location: &str, days: Option<i64>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("key", self.api_key.clone()),
            ("q", location.to_string()),
        ];
        match query {
            WeatherQuery::Current => params.push(("aqi", "no".to_string())),
            WeatherQuery::CurrentWithAqi => params.push(("aqi", "yes".to_string())),
            WeatherQuery::Forecast => {
                let requested = normalize_days(days);
                if requested != FORECAST_WINDOW_DAYS {
                    debug!(
                        requested_days = requested,
                        window_days = FORECAST_WINDOW_DAYS,
                        "Forecast window is fixed; requested day count not forwarded"
                    );
                }
                params.push(("aqi", "yes".to_string()));
                params.push(("alerts", "yes".to_string()));
                params.push(("days", FORECAST_WINDOW_DAYS.to_string()));
            }
        }
        params
    }
}

fn classify(err: &reqwest::Error) -> FailureKind {
    if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_connect() {
        FailureKind::ConnectionFailure
    } else if err.is_decode() {
        // The response arrived but its body would not parse
        FailureKind::UnexpectedError
    } else {
        FailureKind::OtherRequestError
    }
}

/// Pull `error.message` out of a provider error body
fn provider_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["error"]["message"].as_str().map(str::to_string)
}

fn failed(url: &str, kind: FailureKind, message: String, status: Option<u16>) -> FetchOutcome {
    error!(endpoint = %url, kind = %kind, status = ?status, message = %message, "Weather request failed");
    FetchOutcome::failure(kind, message, status)
}
