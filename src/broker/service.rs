//! Credential retrieval.
//!
//! `CredentialBroker` turns a scope definition and a database user into a
//! plaintext password:
//! 1. Fail fast unless `initialize` has completed
//! 2. Build the request from scope, host identity and broker identity
//! 3. Encode, send with bounded retry, decode
//! 4. Map a denial (`resultcode` 0) to `BrokerError::Denied`
//! 5. Decrypt the ciphertext with `nonce + app_check_code`
//! 6. Reject empty credentials
//!
//! Any number of scopes can be served concurrently. The only shared state is
//! the `BrokerState` fixed at initialization.

#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use secrecy::SecretString;

use crate::config::{BrokerSettings, ScopeRegistry};
use crate::crypto;
use crate::error::{BrokerError, BrokerResult, InitError};
use crate::host::{local_host, HostIdentity};
use crate::logging::structured::LogContext;
use crate::model::{ResponseOutcome, ScopeDefinition};
use crate::protocol::{decode_response, encode_request};
use crate::security::redact::payload_fingerprint;
use crate::transport::{send_with_retry, HttpTransport, RetryPolicy, Transport};

use super::state::{validate_settings, BrokerState};

/// Where a resolved password came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Broker,
    /// The scope's configured fallback password, after a failed retrieval.
    Fallback,
}

#[derive(Debug)]
pub struct ResolvedCredential {
    pub password: SecretString,
    pub source: CredentialSource,
}

/// Everything the connection layer needs to open a connection for a scope.
#[derive(Debug)]
pub struct ConnectionCredentials {
    pub scope: String,
    pub url: String,
    pub username: String,
    pub driver_class_name: String,
    pub password: SecretString,
    pub source: CredentialSource,
}

pub struct CredentialBroker {
    settings: BrokerSettings,
    transport: Option<Arc<dyn Transport>>,
    host: Option<HostIdentity>,
    init_lock: Mutex<()>,
    state: OnceLock<BrokerState>,
    #[cfg(test)]
    init_runs: AtomicUsize,
}

impl CredentialBroker {
    /// Broker talking HTTP to the configured endpoints.
    pub fn new(settings: BrokerSettings) -> Self {
        Self {
            settings,
            transport: None,
            host: None,
            init_lock: Mutex::new(()),
            state: OnceLock::new(),
            #[cfg(test)]
            init_runs: AtomicUsize::new(0),
        }
    }

    /// Broker using a caller-supplied transport instead of HTTP.
    pub fn with_transport(settings: BrokerSettings, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport: Some(transport),
            ..Self::new(settings)
        }
    }

    /// Use a fixed host identity instead of resolving the local host.
    pub fn with_host_identity(mut self, host: HostIdentity) -> Self {
        self.host = Some(host);
        self
    }

    pub fn settings(&self) -> &BrokerSettings {
        &self.settings
    }

    pub fn is_initialized(&self) -> bool {
        self.state.get().is_some()
    }

    /// One-time setup. Safe to call repeatedly and from racing threads;
    /// exactly one caller runs the setup, the rest see its result.
    ///
    /// A failure here is fatal to startup: retrieval keeps failing with
    /// `NotInitialized` until a later call succeeds.
    ///
    /// No logger is installed here; hosts that want the crate's default
    /// call [`crate::init_logger`] themselves.
    pub fn initialize(&self) -> Result<(), InitError> {
        if self.is_initialized() {
            return Ok(());
        }
        let _guard = self.init_lock.lock();
        if self.is_initialized() {
            log::debug!("BROKER_ALREADY_INITIALIZED");
            return Ok(());
        }
        #[cfg(test)]
        self.init_runs.fetch_add(1, Ordering::SeqCst);

        if let Err(e) = validate_settings(&self.settings) {
            log::error!("BROKER_INIT_FAILED error={}", e);
            return Err(e);
        }
        let transport: Arc<dyn Transport> = match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => Arc::new(HttpTransport::new(&self.settings.transport)?),
        };
        let host = match &self.host {
            Some(host) => host.clone(),
            None => local_host().clone(),
        };

        let state = BrokerState::new(&self.settings, host, transport)?;

        log::info!(
            "BROKER_INITIALIZED app_name={} base_url={} host_name={} host_ip={} max_attempts={}",
            state.app_name,
            state.base_url,
            state.host.host_name,
            state.host.host_ip,
            self.settings.transport.max_attempts
        );
        if self.state.set(state).is_err() {
            log::debug!("BROKER_ALREADY_INITIALIZED");
        }
        Ok(())
    }

    /// Fetch and decrypt the password of `username` for `scope`.
    pub fn retrieve(&self, scope: &ScopeDefinition, username: &str) -> BrokerResult<SecretString> {
        let ctx = LogContext::new(&scope.name).with_user(username);

        let state = match self.state.get() {
            Some(state) => state,
            None => {
                log::error!("{} CREDENTIAL_REQUEST_REJECTED reason=not_initialized", ctx);
                return Err(BrokerError::NotInitialized);
            }
        };

        if username.trim().is_empty() {
            return Err(BrokerError::InvalidRequest(format!(
                "username is required for scope {}",
                scope.name
            )));
        }
        if scope.tns.trim().is_empty() {
            return Err(BrokerError::InvalidRequest(format!(
                "tns is required for scope {}",
                scope.name
            )));
        }

        let request = state.request_for(scope, username, &self.settings);
        let body = encode_request(&request)?;
        let timeout = scope
            .http_timeout
            .unwrap_or_else(|| self.settings.transport.read_timeout());
        let policy = RetryPolicy::new(self.settings.transport.max_attempts);

        log::info!(
            "{} CREDENTIAL_REQUEST_SENT tns={} db_kind={} endpoint={} timeout_ms={}",
            ctx,
            request.tns,
            request.db_kind.code(),
            request.broker_url,
            timeout.as_millis()
        );

        let raw = send_with_retry(
            state.transport.as_ref(),
            &policy,
            &request.broker_url,
            &body,
            timeout,
            &ctx,
        )?;

        let response = decode_response(&raw).map_err(|e| {
            log::error!(
                "{} CREDENTIAL_RESPONSE_INVALID fingerprint={} error={}",
                ctx,
                payload_fingerprint(&raw),
                e
            );
            e
        })?;

        let credential = match response.outcome {
            ResponseOutcome::Denied { error_message } => {
                log::warn!(
                    "{} CREDENTIAL_DENIED result_code={} message={}",
                    ctx,
                    response.result_code.0,
                    error_message
                );
                return Err(BrokerError::Denied {
                    message: error_message,
                });
            }
            ResponseOutcome::Granted(credential) => credential,
        };

        if credential.tns != request.tns || credential.username != request.username {
            log::warn!(
                "{} CREDENTIAL_RESPONSE_MISMATCH tns={} dbuser={}",
                ctx,
                credential.tns,
                credential.username
            );
        }

        if credential.encrypted_password.trim().is_empty() {
            log::error!("{} CREDENTIAL_EMPTY stage=ciphertext", ctx);
            return Err(BrokerError::EmptyCredential {
                username: username.to_string(),
            });
        }

        let plaintext = crypto::decrypt(
            &credential.encrypted_password,
            &credential.nonce,
            &state.app_check_code,
            self.settings.ciphertext_encoding,
        )
        .map_err(|e| {
            log::error!("{} CREDENTIAL_DECRYPT_FAILED error={}", ctx, e);
            e
        })?;

        if plaintext.is_empty() {
            log::error!("{} CREDENTIAL_EMPTY stage=plaintext", ctx);
            return Err(BrokerError::EmptyCredential {
                username: username.to_string(),
            });
        }

        log::info!(
            "{} CREDENTIAL_RETRIEVED result_code={}",
            ctx,
            response.result_code.0
        );
        Ok(SecretString::from(plaintext))
    }

    /// Retrieve for a registered scope, using the scope's own username.
    pub fn retrieve_named(&self, registry: &ScopeRegistry, name: &str) -> BrokerResult<SecretString> {
        if !self.is_initialized() {
            return Err(BrokerError::NotInitialized);
        }
        let scope = registry.get(name)?;
        self.retrieve(scope, &scope.username)
    }

    /// Retrieve, or use the scope's fallback password when the scope opts in.
    ///
    /// Caller contract violations (`NotInitialized`, `InvalidRequest`) never
    /// fall back.
    pub fn retrieve_with_fallback(
        &self,
        scope: &ScopeDefinition,
        username: &str,
    ) -> BrokerResult<ResolvedCredential> {
        match self.retrieve(scope, username) {
            Ok(password) => Ok(ResolvedCredential {
                password,
                source: CredentialSource::Broker,
            }),
            Err(e @ (BrokerError::NotInitialized | BrokerError::InvalidRequest(_))) => Err(e),
            Err(e) if scope.fallback_on_failure && !scope.fallback_password.is_empty() => {
                log::warn!(
                    "{} CREDENTIAL_FALLBACK_USED error={}",
                    LogContext::new(&scope.name).with_user(username),
                    e
                );
                Ok(ResolvedCredential {
                    password: SecretString::from(scope.fallback_password.clone()),
                    source: CredentialSource::Fallback,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Resolve connection parameters and password for a registered scope.
    pub fn resolve_connection(
        &self,
        registry: &ScopeRegistry,
        name: &str,
    ) -> BrokerResult<ConnectionCredentials> {
        if !self.is_initialized() {
            return Err(BrokerError::NotInitialized);
        }
        let scope = registry.get(name)?;
        if scope.username.trim().is_empty() {
            return Err(BrokerError::InvalidRequest(format!(
                "username is not configured for scope {}",
                name
            )));
        }

        let resolved = self.retrieve_with_fallback(scope, &scope.username)?;
        Ok(ConnectionCredentials {
            scope: scope.name.clone(),
            url: scope.url.clone(),
            username: scope.username.clone(),
            driver_class_name: scope.driver_class_name.clone(),
            password: resolved.password,
            source: resolved.source,
        })
    }

    #[cfg(test)]
    pub(crate) fn init_runs(&self) -> usize {
        self.init_runs.load(Ordering::SeqCst)
    }
}
