use async_trait::async_trait;
use log::{debug, info};
use serde_json::{Map, Value};
use std::env;
use tokio::time::{timeout, Duration};

use crate::error::FetchError;

/// Where the public trigger document lives
pub const DEFAULT_TRIGGERS_URL: &str = "https://static.sk1er.club/autogg/regex_triggers_new.json";

pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;

/// Anything that can produce the `servers` object of a trigger document
#[async_trait]
pub trait RuleSource: Send + Sync {
    /// Fetch the document and return its `servers` object, in document order
    async fn fetch_document(&self) -> Result<Map<String, Value>, FetchError>;
}

/// Configuration for the HTTP trigger fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub url: String,
    pub user_agent: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    /// Honour HTTP(S)_PROXY style environment variables
    pub use_system_proxy: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_TRIGGERS_URL.to_string(),
            user_agent: default_user_agent(),
            connect_timeout_ms: DEFAULT_TIMEOUT_MS,
            read_timeout_ms: DEFAULT_TIMEOUT_MS,
            use_system_proxy: true,
        }
    }
}

impl FetcherConfig {
    /// Load fetcher settings from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let url = env::var("AUTOGG_TRIGGERS_URL").unwrap_or(defaults.url);
        let user_agent = env::var("AUTOGG_USER_AGENT").unwrap_or(defaults.user_agent);

        let connect_timeout_ms = env::var("AUTOGG_CONNECT_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.connect_timeout_ms);

        let read_timeout_ms = env::var("AUTOGG_READ_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.read_timeout_ms);

        let use_system_proxy = env::var("AUTOGG_USE_SYSTEM_PROXY")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(defaults.use_system_proxy);

        info!(
            "Trigger source: {} (connect timeout {} ms, read timeout {} ms)",
            url, connect_timeout_ms, read_timeout_ms
        );

        Self {
            url,
            user_agent,
            connect_timeout_ms,
            read_timeout_ms,
            use_system_proxy,
        }
    }
}

fn default_user_agent() -> String {
    format!("autogg/{} (AutoGG trigger fetcher)", crate::VERSION)
}

/// Fetches the trigger document over HTTP with a single GET, no retries
pub struct HttpRuleFetcher {
    client: reqwest::Client,
    config: FetcherConfig,
}

impl HttpRuleFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms));
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    fn transport_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.config.connect_timeout_ms)
        } else {
            FetchError::Transport(err)
        }
    }
}

#[async_trait]
impl RuleSource for HttpRuleFetcher {
    /// Connecting is bounded by the connect timeout. Sending the request and waiting
    /// for the response headers share a budget of connect + read timeout. The body is
    /// then read under the read timeout as a whole, not per socket read.
    async fn fetch_document(&self) -> Result<Map<String, Value>, FetchError> {
        let read_timeout = Duration::from_millis(self.config.read_timeout_ms);
        let header_budget_ms = self.config.connect_timeout_ms + self.config.read_timeout_ms;

        debug!("Fetching trigger document from {}", self.config.url);

        let response = timeout(
            Duration::from_millis(header_budget_ms),
            self.client.get(&self.config.url).send(),
        )
        .await
        .map_err(|_| FetchError::Timeout(header_budget_ms))?
        .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = timeout(read_timeout, response.text())
            .await
            .map_err(|_| FetchError::Timeout(self.config.read_timeout_ms))?
            .map_err(|e| self.transport_error(e))?;

        debug!("Received trigger document ({} bytes)", body.len());
        extract_servers(&body)
    }
}

/// Parse a document body and take its top-level `servers` object
pub fn extract_servers(body: &str) -> Result<Map<String, Value>, FetchError> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(mut root) => match root.remove("servers") {
            Some(Value::Object(servers)) => Ok(servers),
            _ => Err(FetchError::MissingServers),
        },
        _ => Err(FetchError::MissingServers),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_servers_in_order() {
        let servers = extract_servers(r#"{"servers": {"b": {}, "a": {}}, "other": 1}"#).unwrap();
        assert_eq!(servers.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn test_malformed_json_is_fetch_error() {
        assert!(matches!(extract_servers("{not json"), Err(FetchError::InvalidJson(_))));
        assert!(matches!(extract_servers(""), Err(FetchError::InvalidJson(_))));
    }

    #[test]
    fn test_missing_or_wrong_servers_field() {
        assert!(matches!(extract_servers(r#"{"other": {}}"#), Err(FetchError::MissingServers)));
        assert!(matches!(extract_servers(r#"{"servers": []}"#), Err(FetchError::MissingServers)));
        assert!(matches!(extract_servers("[1, 2]"), Err(FetchError::MissingServers)));
    }

    #[test]
    fn test_default_config() {
        let config = FetcherConfig::default();
        assert_eq!(config.url, DEFAULT_TRIGGERS_URL);
        assert_eq!(config.connect_timeout_ms, 20_000);
        assert_eq!(config.read_timeout_ms, 20_000);
        assert!(config.use_system_proxy);
        assert!(config.user_agent.starts_with("autogg/"));
    }
}
