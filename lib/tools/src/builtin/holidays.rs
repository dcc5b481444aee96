//! Holiday lookup over an iCalendar feed.

use crate::error::HandlerError;
use crate::tool::{Tool, ToolDefinition, parse_args};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use icalendar::{Calendar, CalendarComponent, Component, DatePerhapsTime, EventLike};
use serde::Deserialize;
use tracing::info;

/// Lists local bank and public holidays from an ICS feed.
#[derive(Debug, Clone)]
pub struct HolidaysTool {
    client: reqwest::Client,
    link: String,
}

/// A single all-day calendar entry.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Holiday {
    date: NaiveDate,
    summary: String,
}

#[derive(Debug, Default, Deserialize)]
struct Args {
    #[serde(default)]
    before_date: Option<DateTime<Utc>>,
    #[serde(default)]
    after_date: Option<DateTime<Utc>>,
    #[serde(default)]
    max_count: Option<usize>,
}

/// Extracts every event that starts on a whole date.
///
/// Events with a timed or missing `DTSTART` are skipped.
fn holidays_from(calendar: &Calendar) -> Vec<Holiday> {
    calendar
        .components
        .iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => Some(event),
            _ => None,
        })
        .filter_map(|event| match event.get_start()? {
            DatePerhapsTime::Date(date) => Some(Holiday {
                date,
                summary: event.get_summary().unwrap_or_default().trim().to_string(),
            }),
            DatePerhapsTime::DateTime(_) => None,
        })
        .collect()
}

fn parse_calendar(raw: &str) -> Result<Vec<Holiday>, String> {
    let calendar: Calendar = raw.parse()?;
    Ok(holidays_from(&calendar))
}

fn select(holidays: &[Holiday], args: &Args) -> Vec<String> {
    let mut selected = Vec::new();
    for holiday in holidays {
        if args.max_count.is_some_and(|max| max > 0 && selected.len() >= max) {
            break;
        }

        let start = holiday.date.and_time(chrono::NaiveTime::MIN).and_utc();
        if args.before_date.is_some_and(|before| start > before) {
            continue;
        }
        if args.after_date.is_some_and(|after| start < after) {
            continue;
        }

        selected.push(format!("{}: {}", holiday.date.format("%Y-%m-%d"), holiday.summary));
    }
    selected
}

impl HolidaysTool {
    /// Creates the tool reading from the given ICS link.
    #[must_use]
    pub fn new(client: reqwest::Client, link: impl Into<String>) -> Self {
        Self {
            client,
            link: link.into(),
        }
    }

    async fn load(&self) -> Result<Vec<Holiday>, HandlerError> {
        info!(link = %self.link, "loading holiday calendar");

        let failed = |details: String| HandlerError::Failed {
            reason: "failed to load holiday events".to_string(),
            details,
        };

        let response = self
            .client
            .get(&self.link)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(failed(format!("calendar feed returned {}", response.status())));
        }
        let body = response.text().await.map_err(|e| failed(e.to_string()))?;

        parse_calendar(&body).map_err(failed)
    }
}

#[async_trait]
impl Tool for HolidaysTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get_holidays",
            "Gets local bank and public holidays. Each line is a single holiday in the format 'YYYY-MM-DD: Holiday Name'.",
        )
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "before_date": {
                    "type": "string",
                    "description": "Optional date in RFC3339 format to get holidays before this date. If not provided, all holidays will be returned."
                },
                "after_date": {
                    "type": "string",
                    "description": "Optional date in RFC3339 format to get holidays after this date. If not provided, all holidays will be returned."
                },
                "max_count": {
                    "type": "integer",
                    "description": "Optional maximum number of holidays to return. If not provided, all holidays will be returned."
                }
            }
        }))
    }

    async fn handle(&self, arguments: &str) -> Result<String, HandlerError> {
        let args: Args = parse_args(arguments)?;
        let holidays = self.load().await?;
        Ok(select(&holidays, &args).join("\n"))
    }
}
