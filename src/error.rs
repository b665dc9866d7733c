//! Error taxonomy for credential retrieval.
//!
//! None of these types carry key material, ciphertext or plaintext. Raw
//! payloads are only attached after redaction.

use thiserror::Error;

/// Failure of a single transport attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for AttemptError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AttemptError::Timeout(err.to_string())
        } else if err.is_connect() {
            AttemptError::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            AttemptError::Status(status.as_u16())
        } else {
            AttemptError::Request(err.to_string())
        }
    }
}

/// All attempts against the broker failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("broker unreachable after {attempts} attempt(s): {last}")]
pub struct TransportError {
    pub attempts: u32,
    #[source]
    pub last: AttemptError,
}

/// Envelope could not be written or read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("failed to encode envelope: {0}")]
    Encode(String),
    /// `payload` is already redacted.
    #[error("failed to decode broker response: {reason} (payload: {payload})")]
    Decode { reason: String, payload: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecryptionError {
    #[error("derived key is {len} byte(s), at least 8 required")]
    KeyTooShort { len: usize },
    #[error("ciphertext is not valid {encoding}")]
    InvalidEncoding { encoding: &'static str },
    #[error("ciphertext has invalid length or padding")]
    InvalidCiphertext,
    #[error("decrypted credential is not valid UTF-8")]
    InvalidUtf8,
}

/// Broker could not be brought up. Fatal to startup.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("missing broker setting: {0}")]
    MissingSetting(&'static str),
    #[error("invalid broker base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("credential broker not initialized")]
    NotInitialized,
    #[error("scope not registered: {0}")]
    ScopeNotFound(String),
    #[error("invalid credential request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("broker denied credential request: {message}")]
    Denied { message: String },
    #[error("failed to decrypt credential: {0}")]
    Decryption(#[from] DecryptionError),
    #[error("broker returned an empty credential for user {username}")]
    EmptyCredential { username: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type BrokerResult<T> = Result<T, BrokerError>;
