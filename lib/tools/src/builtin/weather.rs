//! Weather tool backed by WeatherAPI.
//!
//! A single call returns both current conditions and a 3-day forecast.

use crate::error::HandlerError;
use crate::tool::{Tool, ToolDefinition, parse_args};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt::Write as _;
use tracing::debug;

const FORECAST_URL: &str = "https://api.weatherapi.com/v1/forecast.json";
const FORECAST_DAYS: &str = "3";

/// Looks up current weather and a short forecast for a location.
#[derive(Debug, Clone)]
pub struct WeatherTool {
    client: reqwest::Client,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    location: Location,
    current: Current,
    #[serde(default)]
    forecast: Forecast,
}

#[derive(Debug, Deserialize)]
struct Location {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Condition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct Current {
    temp_c: f64,
    condition: Condition,
    wind_kph: f64,
}

#[derive(Debug, Default, Deserialize)]
struct Forecast {
    #[serde(rename = "forecastday", default)]
    days: Vec<ForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ForecastDay {
    date: String,
    day: DaySummary,
}

#[derive(Debug, Deserialize)]
struct DaySummary {
    avgtemp_c: f64,
    condition: Condition,
    maxwind_kph: f64,
}

impl ForecastResponse {
    fn render(&self) -> String {
        let mut out = format!(
            "{}: {:.1}°C, {}, wind {:.1} km/h\n",
            self.location.name, self.current.temp_c, self.current.condition.text, self.current.wind_kph
        );
        for day in &self.forecast.days {
            let _ = writeln!(
                out,
                "{}: {:.1}°C avg, {} (wind {:.1} km/h)",
                day.date, day.day.avgtemp_c, day.day.condition.text, day.day.maxwind_kph
            );
        }
        out
    }
}

impl WeatherTool {
    /// Creates the tool.
    #[must_use]
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    async fn fetch(&self, location: &str) -> Result<ForecastResponse, HandlerError> {
        debug!(location, "fetching weather forecast");

        let response = self
            .client
            .get(FORECAST_URL)
            .query(&[
                ("key", self.api_key.as_deref().unwrap_or_default()),
                ("q", location),
                ("days", FORECAST_DAYS),
            ])
            .send()
            .await
            .map_err(|e| HandlerError::unavailable("weather", e))?;

        if !response.status().is_success() {
            return Err(HandlerError::unavailable(
                "weather",
                format!("forecast API returned {}", response.status()),
            ));
        }

        response
            .json::<ForecastResponse>()
            .await
            .map_err(|e| HandlerError::unavailable("weather", e))
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get_weather",
            "Get the current weather AND a 3-day forecast for the given location. Always include both in the reply.",
        )
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "City or place name, e.g. Barcelona"
                }
            },
            "required": ["location"]
        }))
    }

    async fn handle(&self, arguments: &str) -> Result<String, HandlerError> {
        #[derive(Deserialize)]
        struct Args {
            location: String,
        }

        let args: Args = parse_args(arguments).map_err(|e| {
            HandlerError::invalid_arguments("could not parse location", e.details())
        })?;

        let forecast = self.fetch(args.location.trim()).await?;
        Ok(forecast.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "location": { "name": "Barcelona", "country": "Spain" },
        "current": { "temp_c": 25.0, "condition": { "text": "Sunny" }, "wind_kph": 11.2 },
        "forecast": { "forecastday": [
            { "date": "2025-06-01", "day": { "avgtemp_c": 24.3, "condition": { "text": "Sunny" }, "maxwind_kph": 14.8 } },
            { "date": "2025-06-02", "day": { "avgtemp_c": 22.9, "condition": { "text": "Patchy rain nearby" }, "maxwind_kph": 19.1 } }
        ] }
    }"#;

    #[test]
    fn renders_current_and_forecast() {
        let response: ForecastResponse = serde_json::from_str(SAMPLE).expect("deserialize");
        assert_eq!(
            response.render(),
            "Barcelona: 25.0°C, Sunny, wind 11.2 km/h\n\
             2025-06-01: 24.3°C avg, Sunny (wind 14.8 km/h)\n\
             2025-06-02: 22.9°C avg, Patchy rain nearby (wind 19.1 km/h)\n"
        );
    }

    #[test]
    fn forecast_is_optional() {
        let response: ForecastResponse = serde_json::from_str(
            r#"{"location":{"name":"Oslo"},"current":{"temp_c":-3.5,"condition":{"text":"Snow"},"wind_kph":5.0}}"#,
        )
        .expect("deserialize");
        assert_eq!(response.render(), "Oslo: -3.5°C, Snow, wind 5.0 km/h\n");
    }

    #[tokio::test]
    async fn missing_location_is_invalid() {
        let tool = WeatherTool::new(reqwest::Client::new(), None);
        let err = tool.handle("{}").await.unwrap_err();
        assert!(matches!(err, HandlerError::InvalidArguments { .. }));
        assert_eq!(err.to_string(), "could not parse location");
    }

    #[test]
    fn location_is_required() {
        let tool = WeatherTool::new(reqwest::Client::new(), None);
        assert_eq!(tool.definition().required_parameters(), vec!["location"]);
    }
}
