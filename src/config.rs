//! Client configuration: endpoint paths, storage key and poll policy.
//!
//! The page hands a JSON object to `init_game`; every field is optional and
//! falls back to the values the story server ships with.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ClientError;

/// Fixed localStorage key holding the whole save collection.
pub const DEFAULT_STORAGE_KEY: &str = "story_saves";

/// Retry and reveal timings for the image poller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    /// Delay between page bootstrap and the first check.
    pub initial_delay_ms: u64,
    /// Delay after a check that found no image yet.
    pub absent_delay_ms: u64,
    /// Delay after a failed check or a failed image load.
    pub retry_delay_ms: u64,
    /// Duration of the opacity fade once the image has loaded.
    pub fade_ms: u64,
    /// Abandon a single check after this long. `None` leaves it to the transport.
    pub check_timeout_ms: Option<u64>,
    /// Give up after this many consecutive absent/failed outcomes.
    /// `None` retries until revealed or stopped.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1000,
            absent_delay_ms: 2000,
            retry_delay_ms: 3000,
            fade_ms: 500,
            check_timeout_ms: None,
            max_attempts: None,
        }
    }
}

impl PollPolicy {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn absent_delay(&self) -> Duration {
        Duration::from_millis(self.absent_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }

    pub fn check_timeout(&self) -> Option<Duration> {
        self.check_timeout_ms.map(Duration::from_millis)
    }
}

/// Server endpoint paths (same-origin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub image_check: String,
    pub snapshot: String,
    pub restore: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            image_check: "/get_image".to_string(),
            snapshot: "/save".to_string(),
            restore: "/load_save".to_string(),
        }
    }
}

/// Complete client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoints: Endpoints,
    pub storage_key: String,
    pub poll: PollPolicy,
    /// `tracing` env-filter directive, e.g. `"info"` or `"story_client=debug"`.
    pub log_filter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            poll: PollPolicy::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Parse from JSON. An empty or whitespace-only string yields the defaults.
    pub fn from_json(json: &str) -> Result<Self, ClientError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ClientConfig = serde_json::from_str(json)
            .map_err(|e| ClientError::Config(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`from_json`](Self::from_json), but an unusable config yields the
    /// defaults alongside the error so the caller can still boot.
    pub fn from_json_or_default(json: &str) -> (Self, Option<ClientError>) {
        match Self::from_json(json) {
            Ok(config) => (config, None),
            Err(err) => (Self::default(), Some(err)),
        }
    }

    /// Reject settings that would break the poller's termination or urgency
    /// ordering, or address nothing.
    pub fn validate(&self) -> Result<(), ClientError> {
        let p = &self.poll;
        if p.absent_delay_ms == 0 || p.retry_delay_ms == 0 {
            return Err(ClientError::Config("poll delays must be non-zero".into()));
        }
        if p.absent_delay_ms > p.retry_delay_ms {
            return Err(ClientError::Config(format!(
                "absent_delay_ms ({}) must not exceed retry_delay_ms ({})",
                p.absent_delay_ms, p.retry_delay_ms
            )));
        }
        if p.check_timeout_ms == Some(0) {
            return Err(ClientError::Config("check_timeout_ms must be non-zero".into()));
        }
        if p.max_attempts == Some(0) {
            return Err(ClientError::Config("max_attempts must be at least 1".into()));
        }
        if self.storage_key.trim().is_empty() {
            return Err(ClientError::Config("storage_key must not be empty".into()));
        }
        let e = &self.endpoints;
        if [&e.image_check, &e.snapshot, &e.restore]
            .iter()
            .any(|path| path.trim().is_empty())
        {
            return Err(ClientError::Config("endpoint paths must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_observed_timings() {
        let config = ClientConfig::default();
        assert_eq!(config.poll.initial_delay(), Duration::from_millis(1000));
        assert_eq!(config.poll.absent_delay(), Duration::from_millis(2000));
        assert_eq!(config.poll.retry_delay(), Duration::from_millis(3000));
        assert!(config.poll.max_attempts.is_none());
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_json_gives_defaults() {
        assert_eq!(ClientConfig::from_json("  ").unwrap(), ClientConfig::default());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config =
            ClientConfig::from_json(r#"{"poll":{"max_attempts":5},"storage_key":"k"}"#).unwrap();
        assert_eq!(config.poll.max_attempts, Some(5));
        assert_eq!(config.poll.absent_delay_ms, 2000);
        assert_eq!(config.storage_key, "k");
        assert_eq!(config.endpoints.image_check, "/get_image");
    }

    #[test]
    fn rejects_inverted_delay_ordering() {
        let err = ClientConfig::from_json(r#"{"poll":{"absent_delay_ms":5000}}"#).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(ClientConfig::from_json("{not json").is_err());
    }

    #[test]
    fn unusable_config_falls_back_to_defaults() {
        let (config, err) = ClientConfig::from_json_or_default("{not json");
        assert_eq!(config, ClientConfig::default());
        assert!(matches!(err, Some(ClientError::Config(_))));

        let (config, err) = ClientConfig::from_json_or_default(r#"{"storage_key":"k"}"#);
        assert_eq!(config.storage_key, "k");
        assert!(err.is_none());
    }

    #[test]
    fn rejects_empty_endpoint() {
        let mut config = ClientConfig::default();
        config.endpoints.restore = String::new();
        assert!(config.validate().is_err());
    }
}
