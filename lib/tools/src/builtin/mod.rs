//! Built-in tools backed by public HTTP APIs.

mod holidays;
mod stock;
mod today;
mod weather;

pub use holidays::HolidaysTool;
pub use stock::StockTool;
pub use today::TodayTool;
pub use weather::WeatherTool;

use crate::tool::Tool;
use serde::Deserialize;
use std::sync::Arc;

/// Configuration for the built-in tools.
#[derive(Debug, Clone, Deserialize)]
pub struct BuiltinToolsConfig {
    /// WeatherAPI key.
    #[serde(default)]
    pub weather_api_key: Option<String>,

    /// Finnhub API token.
    #[serde(default)]
    pub finnhub_token: Option<String>,

    /// ICS feed listing local holidays.
    #[serde(default = "default_holiday_calendar_link")]
    pub holiday_calendar_link: String,
}

fn default_holiday_calendar_link() -> String {
    "https://www.officeholidays.com/ics/spain/catalonia".to_string()
}

impl Default for BuiltinToolsConfig {
    fn default() -> Self {
        Self {
            weather_api_key: None,
            finnhub_token: None,
            holiday_calendar_link: default_holiday_calendar_link(),
        }
    }
}

/// Builds every built-in tool sharing one HTTP client.
#[must_use]
pub fn builtin_tools(config: &BuiltinToolsConfig, client: reqwest::Client) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(TodayTool),
        Arc::new(WeatherTool::new(client.clone(), config.weather_api_key.clone())),
        Arc::new(StockTool::new(client.clone(), config.finnhub_token.clone())),
        Arc::new(HolidaysTool::new(client, config.holiday_calendar_link.clone())),
    ]
}
