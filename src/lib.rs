//! credbroker-core - dynamic database credential broker client
//!
//! Instead of storing database passwords, an application asks a remote
//! broker for one at connection time. The broker answers with a DES
//! ciphertext and a fresh nonce; the password is decrypted locally and
//! never persisted. The implementation prioritizes:
//!
//! 1. **Security** - secrets never reach logs, errors or `Debug` output
//! 2. **Logging** - every exchange logged with request context
//! 3. **Predictability** - bounded retry, typed errors, no hidden state
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `broker` - `CredentialBroker`, one-time initialization and retrieval
//! - `protocol` - XML envelope codec
//! - `transport` - HTTP client and bounded retry
//! - `crypto` - credential decryption
//! - `model` - requests, responses and scope definitions
//! - `config` - broker settings and the scope registry
//! - `host` - local host identity
//! - `security` - payload redaction
//! - `logging` - structured logging with request context
//!
//! ## Example
//!
//! ```no_run
//! use credbroker_core::{BrokerSettings, CredentialBroker, ScopeDefinition};
//! use secrecy::ExposeSecret;
//!
//! let broker = CredentialBroker::new(BrokerSettings::new(
//!     "billing",
//!     "app-check-code",
//!     "http://10.0.0.5:40001/security/querydbuserinfo.do",
//! ));
//! broker.initialize()?;
//!
//! let scope = ScopeDefinition::new("primary", "ORCLTNS", "app_user");
//! let password = broker.retrieve(&scope, "app_user")?;
//! assert!(!password.expose_secret().is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod broker;
pub mod config;
pub mod crypto;
pub mod error;
pub mod host;
pub mod logging;
pub mod model;
pub mod protocol;
pub mod security;
pub mod transport;

#[cfg(test)]
pub mod test_support;

pub use broker::{
    BrokerState, ConnectionCredentials, CredentialBroker, CredentialSource, ResolvedCredential,
};
pub use config::{BrokerSettings, CredentialConfig, ScopeRegistry, TransportSettings};
pub use crypto::CiphertextEncoding;
pub use error::{
    AttemptError, BrokerError, BrokerResult, ConfigError, DecryptionError, InitError,
    ProtocolError, TransportError,
};
pub use host::HostIdentity;
pub use logging::init_logger;
pub use model::{
    ConfigSource, CredentialRequest, CredentialResponse, DbKind, EncryptedCredential,
    ResponseOutcome, ResultCode, ScopeDefinition,
};
pub use transport::{HttpTransport, RetryPolicy, Transport};
