//! Startup configuration from environment variables

use crate::db::DEFAULT_SESSION_TTL;
use crate::llm::{GenerationConfig, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::runtime::StageTimeouts;
use crate::tools::routes::{standard_tool_names, RouteConfig};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MODEL_ID: &str = "hermes-travel";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: String, value: String },
}

#[derive(Clone)]
pub struct Config {
    pub intent_url: String,
    pub sentiment_url: String,
    pub inference_url: String,
    pub model_id: String,
    pub api_key: Option<String>,
    pub routes: RouteConfig,
    pub catalog_path: PathBuf,
    pub db_path: PathBuf,
    pub port: u16,
    pub session_ttl: Duration,
    pub timeouts: StageTimeouts,
    pub tool_timeout: Duration,
    pub generation: GenerationConfig,
}

// Never print the API key
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("intent_url", &self.intent_url)
            .field("sentiment_url", &self.sentiment_url)
            .field("inference_url", &self.inference_url)
            .field("model_id", &self.model_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("routes", &self.routes)
            .field("catalog_path", &self.catalog_path)
            .field("db_path", &self.db_path)
            .field("port", &self.port)
            .field("session_ttl", &self.session_ttl)
            .field("timeouts", &self.timeouts)
            .field("tool_timeout", &self.tool_timeout)
            .field("generation", &self.generation)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let overrides: HashMap<String, String> = standard_tool_names()
            .filter_map(|tool| {
                get(&override_var(tool)).map(|url| (tool.to_string(), url))
            })
            .collect();

        let db_path = get("ORCHESTRATOR_DB_PATH").map_or_else(
            || {
                let home = get("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.travel-orchestrator/sessions.db"))
            },
            PathBuf::from,
        );

        let secs = |name: &str, default: Duration| -> Result<Duration, ConfigError> {
            parse_or(&get, name, default.as_secs()).map(Duration::from_secs)
        };

        Ok(Self {
            intent_url: require("INTENT_API_URL")?,
            sentiment_url: require("SENTIMENT_API_URL")?,
            inference_url: require("INFERENCE_URL")?,
            model_id: get("INFERENCE_MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            api_key: get("INFERENCE_API_KEY"),
            routes: RouteConfig {
                tool_base_url: require("TOOL_API_BASE_URL")?,
                rag_url: require("RAG_API_URL")?,
                overrides,
            },
            catalog_path: get("TOOL_CATALOG_PATH")
                .map_or_else(|| PathBuf::from("INTENT_TOOL_MAP.json"), PathBuf::from),
            db_path,
            port: parse_or(&get, "ORCHESTRATOR_PORT", DEFAULT_PORT)?,
            session_ttl: secs("SESSION_TTL_SECS", DEFAULT_SESSION_TTL)?,
            timeouts: StageTimeouts {
                classify: secs("CLASSIFY_TIMEOUT_SECS", StageTimeouts::default().classify)?,
                inference: secs("INFERENCE_TIMEOUT_SECS", StageTimeouts::default().inference)?,
            },
            tool_timeout: secs("TOOL_TIMEOUT_SECS", DEFAULT_TOOL_TIMEOUT)?,
            generation: GenerationConfig {
                max_tokens: parse_or(&get, "MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
                temperature: parse_or(&get, "TEMPERATURE", DEFAULT_TEMPERATURE)?,
                ..GenerationConfig::default()
            },
        })
    }
}

/// `search_flight` -> `SEARCH_FLIGHT_API_URL`
pub fn override_var(tool: &str) -> String {
    format!("{}_API_URL", tool.to_ascii_uppercase())
}

fn parse_or<T, G>(get: &G, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name: name.to_string(),
            value,
        }),
    }
}
