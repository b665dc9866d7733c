//! Outbound credential request.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Database engine code understood by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DbKind {
    Tt,
    #[default]
    Oracle,
    MySql,
}

impl DbKind {
    pub fn code(self) -> u8 {
        match self {
            DbKind::Tt => 1,
            DbKind::Oracle => 2,
            DbKind::MySql => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(DbKind::Tt),
            2 => Some(DbKind::Oracle),
            3 => Some(DbKind::MySql),
            _ => None,
        }
    }
}

impl TryFrom<u8> for DbKind {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        DbKind::from_code(code).ok_or_else(|| format!("unknown db kind code {}", code))
    }
}

impl From<DbKind> for u8 {
    fn from(kind: DbKind) -> Self {
        kind.code()
    }
}

/// Where the caller's local trust configuration was read from.
///
/// Sent in the `remark` field for broker-side audit only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    #[default]
    HostFile,
    Packaged,
}

impl ConfigSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigSource::HostFile => "1",
            ConfigSource::Packaged => "2",
        }
    }

    pub fn from_wire(flag: &str) -> Option<Self> {
        match flag.trim() {
            "1" => Some(ConfigSource::HostFile),
            "2" => Some(ConfigSource::Packaged),
            _ => None,
        }
    }
}

/// One-shot request built per retrieval. Never mutated after construction.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRequest {
    pub broker_url: String,
    pub db_kind: DbKind,
    pub tns: String,
    pub username: String,
    /// Placeholder sent in `dbuserpwd`. Meaning is broker-defined.
    pub fallback_password: String,
    pub host_name: String,
    pub host_ip: String,
    pub app_name: String,
    pub app_check_code: String,
    pub config_source: ConfigSource,
}

impl fmt::Debug for CredentialRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRequest")
            .field("broker_url", &self.broker_url)
            .field("db_kind", &self.db_kind)
            .field("tns", &self.tns)
            .field("username", &self.username)
            .field("fallback_password", &"[REDACTED]")
            .field("host_name", &self.host_name)
            .field("host_ip", &self.host_ip)
            .field("app_name", &self.app_name)
            .field("app_check_code", &"[REDACTED]")
            .field("config_source", &self.config_source)
            .finish()
    }
}
