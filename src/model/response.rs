//! Parsed broker response.
//!
//! The broker signals denial with result code `0` and success with any
//! other value. That polarity is decided here and nowhere else.

use std::fmt;

/// Raw `resultcode` from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultCode(pub i32);

impl ResultCode {
    /// Code the reference broker sends for a grant.
    pub const GRANTED: ResultCode = ResultCode(1);
    pub const DENIED: ResultCode = ResultCode(0);

    pub fn is_denial(self) -> bool {
        self.0 == 0
    }
}

/// Encrypted credential returned with a grant.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedCredential {
    pub tns: String,
    pub username: String,
    pub encrypted_password: String,
    pub nonce: String,
}

impl fmt::Debug for EncryptedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedCredential")
            .field("tns", &self.tns)
            .field("username", &self.username)
            .field("encrypted_password", &"[REDACTED]")
            .field("nonce", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    Denied { error_message: String },
    Granted(EncryptedCredential),
}

/// Result of one broker exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialResponse {
    pub result_code: ResultCode,
    pub outcome: ResponseOutcome,
}

impl CredentialResponse {
    pub fn denied(message: &str) -> Self {
        Self {
            result_code: ResultCode::DENIED,
            outcome: ResponseOutcome::Denied {
                error_message: message.to_string(),
            },
        }
    }

    pub fn granted(credential: EncryptedCredential) -> Self {
        Self {
            result_code: ResultCode::GRANTED,
            outcome: ResponseOutcome::Granted(credential),
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self.outcome, ResponseOutcome::Granted(_))
    }
}
