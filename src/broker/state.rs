//! Initialized broker state.
//!
//! Built exactly once by `CredentialBroker::initialize` and read-only
//! afterwards. Every retrieval shares it without locking.

use std::fmt;
use std::sync::Arc;

use reqwest::Url;

use crate::config::BrokerSettings;
use crate::error::InitError;
use crate::host::HostIdentity;
use crate::model::{CredentialRequest, ScopeDefinition};
use crate::transport::Transport;

pub struct BrokerState {
    pub app_name: String,
    pub app_check_code: String,
    pub base_url: String,
    pub host: HostIdentity,
    pub transport: Arc<dyn Transport>,
}

impl BrokerState {
    pub fn new(
        settings: &BrokerSettings,
        host: HostIdentity,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, InitError> {
        validate_settings(settings)?;
        Ok(Self {
            app_name: settings.app_name.trim().to_string(),
            app_check_code: settings.app_check_code.clone(),
            base_url: settings.base_url.trim().to_string(),
            host,
            transport,
        })
    }

    /// Build the request for one retrieval against `scope`.
    pub fn request_for(
        &self,
        scope: &ScopeDefinition,
        username: &str,
        settings: &BrokerSettings,
    ) -> CredentialRequest {
        CredentialRequest {
            broker_url: scope.endpoint(&self.base_url).to_string(),
            db_kind: scope.db_kind,
            tns: scope.tns.clone(),
            username: username.to_string(),
            fallback_password: scope.fallback_password.clone(),
            host_name: self.host.host_name.clone(),
            host_ip: self.host.host_ip.clone(),
            app_name: self.app_name.clone(),
            app_check_code: self.app_check_code.clone(),
            config_source: settings.config_source,
        }
    }
}

impl fmt::Debug for BrokerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerState")
            .field("app_name", &self.app_name)
            .field("app_check_code", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("host", &self.host)
            .finish()
    }
}

/// Reject settings the broker cannot run with.
pub fn validate_settings(settings: &BrokerSettings) -> Result<(), InitError> {
    if settings.app_name.trim().is_empty() {
        return Err(InitError::MissingSetting("app_name"));
    }
    if settings.app_check_code.is_empty() {
        return Err(InitError::MissingSetting("app_check_code"));
    }

    let base_url = settings.base_url.trim();
    if base_url.is_empty() {
        return Err(InitError::MissingSetting("base_url"));
    }
    let parsed = Url::parse(base_url).map_err(|e| InitError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(InitError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: format!("unsupported scheme {}", parsed.scheme()),
        });
    }
    Ok(())
}
