//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested keys use
//! a double underscore, e.g. `MODEL__API_KEY` or `AGENT__MAX_ROUND_TRIPS`.
//!
//! See [`OpenAiConfig`] for model endpoint settings and
//! [`BuiltinToolsConfig`] for tool credentials.

use parley_ai::{AgentConfig, OpenAiConfig};
use parley_tools::{BuiltinToolsConfig, DEFAULT_TOOL_TIMEOUT};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// PostgreSQL database connection URL.
    /// Conversations are kept in memory when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Model endpoint configuration.
    #[serde(default)]
    pub model: OpenAiConfig,

    /// Agent loop configuration.
    #[serde(default)]
    pub agent: AgentSettings,

    /// Built-in tool credentials.
    #[serde(default)]
    pub tools: BuiltinToolsConfig,
}

/// Agent loop settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSettings {
    /// Maximum model calls per reply.
    #[serde(default = "default_max_round_trips")]
    pub max_round_trips: u32,

    /// Upper bound on a single tool call, in seconds.
    #[serde(default = "default_tool_timeout_seconds")]
    pub tool_timeout_seconds: u64,

    /// Replaces the built-in reply instructions when set.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_max_round_trips() -> u32 {
    parley_ai::DEFAULT_MAX_ROUND_TRIPS
}

fn default_tool_timeout_seconds() -> u64 {
    DEFAULT_TOOL_TIMEOUT.as_secs()
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_round_trips: default_max_round_trips(),
            tool_timeout_seconds: default_tool_timeout_seconds(),
            system_prompt: None,
        }
    }
}

impl AgentSettings {
    /// Returns the agent loop configuration.
    #[must_use]
    pub fn agent_config(&self) -> AgentConfig {
        let config = AgentConfig::default().with_max_round_trips(self.max_round_trips);
        match &self.system_prompt {
            Some(prompt) => config.with_system_prompt(prompt.as_str()),
            None => config,
        }
    }

    /// Returns the per-call tool timeout.
    #[must_use]
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_seconds)
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is present but invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(
            config::Environment::default()
                .separator("__")
                .try_parsing(true),
        )
    }

    fn from_source(
        source: impl config::Source + Send + Sync + 'static,
    ) -> Result<Self, config::ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.agent.max_round_trips == 0 {
            return Err(config::ConfigError::Message(
                "agent.max_round_trips must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn try_load(vars: &[(&str, &str)]) -> Result<ServerConfig, config::ConfigError> {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_source(
            config::Environment::default()
                .separator("__")
                .try_parsing(true)
                .source(Some(source)),
        )
    }

    fn load(vars: &[(&str, &str)]) -> ServerConfig {
        try_load(vars).expect("load config")
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = load(&[]);
        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse().expect("addr"));
        assert!(config.database_url.is_none());
        assert_eq!(config.model.name, "gpt-4.1");
        assert_eq!(config.agent.max_round_trips, 6);
        assert_eq!(config.agent.tool_timeout(), Duration::from_secs(5));
        assert!(config.tools.holiday_calendar_link.contains("officeholidays"));
    }

    #[test]
    fn nested_keys_use_double_underscore() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/parley"),
            ("MODEL__NAME", "gpt-4.1-mini"),
            ("AGENT__MAX_ROUND_TRIPS", "3"),
            ("TOOLS__FINNHUB_TOKEN", "secret"),
            ("AGENT__SYSTEM_PROMPT", "Answer in one sentence."),
        ]);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/parley")
        );
        assert_eq!(config.model.name, "gpt-4.1-mini");
        let agent = config.agent.agent_config();
        assert_eq!(agent.max_round_trips, 3);
        assert_eq!(agent.system_prompt, "Answer in one sentence.");
        assert_eq!(config.tools.finnhub_token.as_deref(), Some("secret"));
    }

    #[test]
    fn zero_round_trips_is_rejected() {
        let err = try_load(&[("AGENT__MAX_ROUND_TRIPS", "0")]).unwrap_err();
        assert!(err.to_string().contains("max_round_trips"));
    }
}
