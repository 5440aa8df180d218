//! Configuration loaded from the environment once at startup.
//!
//! - `ANTHROPIC_API_KEY` - Engine credential. Turns fail without it.
//! - `LLM_GATEWAY` - Optional. Base URL replacing `https://api.anthropic.com`.
//! - `FITFINDER_MODEL` - Optional. Engine model. Defaults to `claude-sonnet-4-20250514`.
//! - `FITFINDER_MAX_TOKENS` - Optional. Output cap per engine call. Defaults to `2048`.
//! - `FITFINDER_INSTRUCTION_MODE` - Optional. `stateful` (default) or `stateless`.
//! - `FITFINDER_MAX_TOOL_ROUNDS` - Optional. Tool executions allowed per turn. Defaults to `8`.
//! - `SERPAPI_API_KEY` - Search credential. Only checked when a search runs.
//! - `SERPAPI_BASE_URL` - Optional. Defaults to `https://serpapi.com/search.json`.
//! - `FITFINDER_HOST` - Optional. Defaults to `127.0.0.1`.
//! - `FITFINDER_PORT` - Optional. Defaults to `8000`.
//! - `FITFINDER_SESSION_IDLE_SECS` - Optional. Idle sessions are dropped after this. Defaults to `3600`.

use crate::runtime::InstructionMode;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_SERPAPI_URL: &str = "https://serpapi.com/search.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Engine connection settings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub api_key: Option<String>,
    pub gateway: Option<String>,
    pub model: String,
    pub max_tokens: u32,
}

/// Shopping search settings
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub engine: EngineConfig,
    pub search: SearchConfig,
    pub instruction_mode: InstructionMode,
    pub max_tool_rounds: u32,
    pub host: String,
    pub port: u16,
    pub session_idle_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            engine: EngineConfig {
                api_key: get("ANTHROPIC_API_KEY"),
                gateway: get("LLM_GATEWAY"),
                model: get("FITFINDER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                max_tokens: parse_or("FITFINDER_MAX_TOKENS", get("FITFINDER_MAX_TOKENS"), 2048)?,
            },
            search: SearchConfig {
                api_key: get("SERPAPI_API_KEY"),
                base_url: get("SERPAPI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_SERPAPI_URL.to_string()),
            },
            instruction_mode: parse_or(
                "FITFINDER_INSTRUCTION_MODE",
                get("FITFINDER_INSTRUCTION_MODE"),
                InstructionMode::Stateful,
            )?,
            max_tool_rounds: parse_or(
                "FITFINDER_MAX_TOOL_ROUNDS",
                get("FITFINDER_MAX_TOOL_ROUNDS"),
                8,
            )?,
            host: get("FITFINDER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or("FITFINDER_PORT", get("FITFINDER_PORT"), 8000)?,
            session_idle_ttl: Duration::from_secs(parse_or(
                "FITFINDER_SESSION_IDLE_SECS",
                get("FITFINDER_SESSION_IDLE_SECS"),
                3600,
            )?),
        })
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert!(config.engine.api_key.is_none());
        assert!(config.search.api_key.is_none());
        assert_eq!(config.engine.model, DEFAULT_MODEL);
        assert_eq!(config.engine.max_tokens, 2048);
        assert_eq!(config.instruction_mode, InstructionMode::Stateful);
        assert_eq!(config.max_tool_rounds, 8);
        assert_eq!(config.port, 8000);
        assert_eq!(config.search.base_url, DEFAULT_SERPAPI_URL);
        assert_eq!(config.session_idle_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("SERPAPI_API_KEY", "serp"),
            ("FITFINDER_INSTRUCTION_MODE", "stateless"),
            ("FITFINDER_MAX_TOOL_ROUNDS", "3"),
            ("FITFINDER_PORT", "9100"),
            ("FITFINDER_SESSION_IDLE_SECS", "90"),
        ])
        .unwrap();
        assert_eq!(config.engine.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.search.api_key.as_deref(), Some("serp"));
        assert_eq!(config.instruction_mode, InstructionMode::Stateless);
        assert_eq!(config.max_tool_rounds, 3);
        assert_eq!(config.port, 9100);
        assert_eq!(config.session_idle_ttl, Duration::from_secs(90));
    }

    #[test]
    fn test_blank_key_is_unset() {
        let config = config(&[("SERPAPI_API_KEY", "  ")]).unwrap();
        assert!(config.search.api_key.is_none());
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config(&[("FITFINDER_PORT", "eighty")]),
            Err(ConfigError::InvalidValue(key, _)) if key == "FITFINDER_PORT"
        ));
        assert!(config(&[("FITFINDER_INSTRUCTION_MODE", "sometimes")]).is_err());
    }
}
