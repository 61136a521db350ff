//! Broker configuration.

use crate::channel::{default_system_channels, Channel};
use crate::core::{Error, Result};
use crate::monitoring::LoggerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Pending intents are dropped two minutes after they were raised.
pub const DEFAULT_PENDING_INTENT_TTL_MS: u64 = 2 * 60 * 1000;

/// Broker configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Preconfigured user channels
    pub system_channels: Vec<Channel>,
    /// Time-to-live of intents queued for launching instances
    pub pending_intent_ttl_ms: u64,
    /// How long a resolver hand-off may stay unanswered (`None` = forever)
    pub resolver_timeout_ms: Option<u64>,
    /// Cap on per-channel context history (`None` = unbounded)
    pub history_limit: Option<usize>,
    /// Base URL of the app directory service
    pub directory_url: Option<String>,
    /// FDC3 version reported in intent resolutions
    pub fdc3_version: String,
    /// Logging
    pub logging: LoggerConfig,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            system_channels: default_system_channels(),
            pending_intent_ttl_ms: DEFAULT_PENDING_INTENT_TTL_MS,
            resolver_timeout_ms: None,
            history_limit: None,
            directory_url: None,
            fdc3_version: "1.2".to_string(),
            logging: LoggerConfig::default(),
        }
    }
}

impl BrokerConfig {
    /// Parse a JSON document; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.pending_intent_ttl_ms == 0 {
            return Err(Error::Config("pending_intent_ttl_ms must be positive".to_string()));
        }
        if self.history_limit == Some(0) {
            return Err(Error::Config("history_limit must be positive".to_string()));
        }
        if let Some(dup) = self
            .system_channels
            .iter()
            .enumerate()
            .find(|(i, c)| self.system_channels[..*i].iter().any(|o| o.id == c.id))
        {
            return Err(Error::Config(format!("duplicate system channel {}", dup.1.id)));
        }
        Ok(())
    }

    /// Pending intent TTL as a chrono duration.
    pub fn pending_intent_ttl(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.pending_intent_ttl_ms as i64)
    }

    /// Resolver timeout, if any.
    pub fn resolver_timeout(&self) -> Option<Duration> {
        self.resolver_timeout_ms.map(Duration::from_millis)
    }

    /// Set the resolver timeout.
    pub fn with_resolver_timeout(mut self, timeout: Duration) -> Self {
        self.resolver_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Set the pending intent TTL.
    pub fn with_pending_intent_ttl(mut self, ttl: Duration) -> Self {
        self.pending_intent_ttl_ms = ttl.as_millis() as u64;
        self
    }

    /// Cap channel history.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }
}
