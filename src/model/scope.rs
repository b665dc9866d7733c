//! Static per-database scope definitions.
//!
//! One definition per logical database ("primary", "secondary", ...). Built
//! once from configuration and only ever read afterwards.

use std::fmt;
use std::time::Duration;

use super::request::DbKind;

#[derive(Clone, PartialEq, Eq)]
pub struct ScopeDefinition {
    pub name: String,
    pub url: String,
    pub username: String,
    pub driver_class_name: String,
    /// Endpoint for this scope. Blank means the broker's base url.
    pub broker_url: String,
    pub db_kind: DbKind,
    pub tns: String,
    pub fallback_password: String,
    /// Overrides the configured per-attempt timeout.
    pub http_timeout: Option<Duration>,
    /// Use `fallback_password` as the credential when retrieval fails.
    pub fallback_on_failure: bool,
}

impl ScopeDefinition {
    pub fn new(name: &str, tns: &str, username: &str) -> Self {
        Self {
            name: name.to_string(),
            url: String::new(),
            username: username.to_string(),
            driver_class_name: String::new(),
            broker_url: String::new(),
            db_kind: DbKind::default(),
            tns: tns.to_string(),
            fallback_password: String::new(),
            http_timeout: None,
            fallback_on_failure: false,
        }
    }

    pub fn with_broker_url(mut self, broker_url: &str) -> Self {
        self.broker_url = broker_url.to_string();
        self
    }

    pub fn with_db_kind(mut self, db_kind: DbKind) -> Self {
        self.db_kind = db_kind;
        self
    }

    pub fn with_fallback_password(mut self, password: &str, use_on_failure: bool) -> Self {
        self.fallback_password = password.to_string();
        self.fallback_on_failure = use_on_failure;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// Endpoint to post to, falling back to `base_url`.
    pub fn endpoint<'a>(&'a self, base_url: &'a str) -> &'a str {
        if self.broker_url.trim().is_empty() {
            base_url
        } else {
            self.broker_url.trim()
        }
    }
}

impl fmt::Debug for ScopeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeDefinition")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("driver_class_name", &self.driver_class_name)
            .field("broker_url", &self.broker_url)
            .field("db_kind", &self.db_kind)
            .field("tns", &self.tns)
            .field("fallback_password", &"[REDACTED]")
            .field("http_timeout", &self.http_timeout)
            .field("fallback_on_failure", &self.fallback_on_failure)
            .finish()
    }
}
