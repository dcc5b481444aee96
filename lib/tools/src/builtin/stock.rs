//! Stock quote tool backed by Finnhub.

use crate::error::HandlerError;
use crate::tool::{Tool, ToolDefinition, parse_args};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

const QUOTE_URL: &str = "https://finnhub.io/api/v1/quote";

/// Looks up real-time quotes for a ticker symbol.
#[derive(Debug, Clone)]
pub struct StockTool {
    client: reqwest::Client,
    token: Option<String>,
}

/// Quote fields returned by Finnhub.
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Quote {
    #[serde(rename = "c")]
    current: f64,
    #[serde(rename = "h")]
    high: f64,
    #[serde(rename = "l")]
    low: f64,
    #[serde(rename = "o")]
    open: f64,
    #[serde(rename = "pc")]
    previous_close: f64,
}

impl Quote {
    fn render(&self, symbol: &str) -> String {
        format!(
            "Current price for {symbol}: ${:.2} (high ${:.2}, low ${:.2}, open ${:.2}, prev close ${:.2})",
            self.current, self.high, self.low, self.open, self.previous_close
        )
    }
}

impl StockTool {
    /// Creates the tool. Without a token every call reports the service as unavailable.
    #[must_use]
    pub fn new(client: reqwest::Client, token: Option<String>) -> Self {
        Self { client, token }
    }

    async fn fetch(&self, symbol: &str) -> Result<Quote, HandlerError> {
        let token = self
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| HandlerError::unavailable("stock", "FINNHUB token not configured"))?;

        debug!(symbol, "fetching stock quote");

        let response = self
            .client
            .get(QUOTE_URL)
            .query(&[("symbol", symbol), ("token", token)])
            .send()
            .await
            .map_err(|e| HandlerError::unavailable("stock", e))?;

        if !response.status().is_success() {
            return Err(HandlerError::unavailable(
                "stock",
                format!("finnhub returned {}", response.status()),
            ));
        }

        response
            .json::<Quote>()
            .await
            .map_err(|e| HandlerError::unavailable("stock", e))
    }
}

#[async_trait]
impl Tool for StockTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get_stock_quote",
            "Get the current market value for a given stock symbol",
        )
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "Ticker symbol, e.g. AAPL, TSLA, MSFT"
                }
            },
            "required": ["symbol"]
        }))
    }

    async fn handle(&self, arguments: &str) -> Result<String, HandlerError> {
        #[derive(Deserialize)]
        struct Args {
            symbol: String,
        }

        let symbol = parse_args::<Args>(arguments)
            .ok()
            .map(|a| a.symbol.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                HandlerError::invalid_arguments("could not parse symbol", "symbol missing or blank")
            })?;

        let quote = self.fetch(&symbol).await?;
        Ok(quote.render(&symbol))
    }
}
