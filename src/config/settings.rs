//! Broker settings and config file loading.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::crypto::CiphertextEncoding;
use crate::error::ConfigError;
use crate::model::ConfigSource;
use crate::transport::DEFAULT_MAX_ATTEMPTS;

use super::registry::{RawScope, ScopeRegistry};

/// Default connect and read timeout, 15 seconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

pub const ENV_APP_NAME: &str = "CREDBROKER_APP_NAME";
pub const ENV_APP_CHECK_CODE: &str = "CREDBROKER_APP_CHECK_CODE";
pub const ENV_BASE_URL: &str = "CREDBROKER_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub max_attempts: u32,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: DEFAULT_TIMEOUT_MS,
            read_timeout_ms: DEFAULT_TIMEOUT_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl TransportSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Process-wide broker identity and protocol settings.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct BrokerSettings {
    pub app_name: String,
    pub app_check_code: String,
    pub base_url: String,
    #[serde(default)]
    pub transport: TransportSettings,
    #[serde(default)]
    pub ciphertext_encoding: CiphertextEncoding,
    #[serde(default)]
    pub config_source: ConfigSource,
}

impl BrokerSettings {
    pub fn new(app_name: &str, app_check_code: &str, base_url: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            app_check_code: app_check_code.to_string(),
            base_url: base_url.to_string(),
            transport: TransportSettings::default(),
            ciphertext_encoding: CiphertextEncoding::default(),
            config_source: ConfigSource::default(),
        }
    }

    /// Apply `CREDBROKER_*` overrides. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(app_name) = non_empty(ENV_APP_NAME) {
            self.app_name = app_name;
        }
        if let Some(app_check_code) = non_empty(ENV_APP_CHECK_CODE) {
            log::info!("BROKER_SETTING_OVERRIDE key={}", ENV_APP_CHECK_CODE);
            self.app_check_code = app_check_code;
        }
        if let Some(base_url) = non_empty(ENV_BASE_URL) {
            log::info!("BROKER_SETTING_OVERRIDE key={} value={}", ENV_BASE_URL, base_url);
            self.base_url = base_url;
        }
    }
}

impl fmt::Debug for BrokerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerSettings")
            .field("app_name", &self.app_name)
            .field("app_check_code", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("transport", &self.transport)
            .field("ciphertext_encoding", &self.ciphertext_encoding)
            .field("config_source", &self.config_source)
            .finish()
    }
}

#[derive(Deserialize)]
struct RawConfig {
    broker: BrokerSettings,
    #[serde(default)]
    scopes: BTreeMap<String, RawScope>,
}

/// Broker settings plus every scope that passed validation.
#[derive(Debug, Clone)]
pub struct CredentialConfig {
    pub broker: BrokerSettings,
    pub scopes: ScopeRegistry,
}

impl CredentialConfig {
    /// Parse a JSON config document. Overrides are not applied.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let parsed: RawConfig = serde_json::from_str(raw)?;
        let scopes = ScopeRegistry::from_raw(parsed.scopes);
        log::info!(
            "BROKER_CONFIG_LOADED base_url={} scopes={:?}",
            parsed.broker.base_url,
            scopes.names()
        );
        Ok(Self {
            broker: parsed.broker,
            scopes,
        })
    }

    /// Read a JSON config file and apply `CREDBROKER_*` environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_json_str(&raw)?;
        config.broker.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }
}
