//! Scope registry.
//!
//! Scopes come from configuration with every field optional. A scope missing
//! a required field is logged and left unregistered; it is not fatal.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::error::BrokerError;
use crate::model::{DbKind, ScopeDefinition};

/// Scope entry as written in the config file.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawScope {
    pub url: Option<String>,
    pub username: Option<String>,
    pub driver_class_name: Option<String>,
    pub broker_url: Option<String>,
    pub db_kind: Option<u8>,
    pub tns: Option<String>,
    pub fallback_password: Option<String>,
    pub http_timeout_ms: Option<u64>,
    pub fallback_on_failure: bool,
}

impl RawScope {
    /// Validate into a definition, or name the first problem found.
    pub fn into_definition(self, name: &str) -> Result<ScopeDefinition, String> {
        fn required(value: Option<String>, field: &str) -> Result<String, String> {
            match value {
                Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
                _ => Err(format!("missing {}", field)),
            }
        }

        let url = required(self.url, "url")?;
        let username = required(self.username, "username")?;
        let driver_class_name = required(self.driver_class_name, "driver_class_name")?;
        let broker_url = required(self.broker_url, "broker_url")?;
        let code = self.db_kind.ok_or_else(|| "missing db_kind".to_string())?;
        let db_kind =
            DbKind::from_code(code).ok_or_else(|| format!("unknown db_kind {}", code))?;
        let tns = required(self.tns, "tns")?;
        // May be empty, but the key must be present.
        let fallback_password = self
            .fallback_password
            .ok_or_else(|| "missing fallback_password".to_string())?;

        Ok(ScopeDefinition {
            name: name.to_string(),
            url,
            username,
            driver_class_name,
            broker_url,
            db_kind,
            tns,
            fallback_password,
            http_timeout: self
                .http_timeout_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
            fallback_on_failure: self.fallback_on_failure,
        })
    }
}

/// Registered scopes by name. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct ScopeRegistry {
    scopes: BTreeMap<String, ScopeDefinition>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_raw(raw: BTreeMap<String, RawScope>) -> Self {
        let mut registry = Self::new();
        for (name, scope) in raw {
            match scope.into_definition(&name) {
                Ok(definition) => {
                    log::info!(
                        "SCOPE_REGISTERED scope={} tns={} db_kind={}",
                        name,
                        definition.tns,
                        definition.db_kind.code()
                    );
                    registry.register(definition);
                }
                Err(reason) => {
                    log::warn!("SCOPE_SKIPPED scope={} reason={}", name, reason);
                }
            }
        }
        registry
    }

    /// Add or replace a scope by its name.
    pub fn register(&mut self, scope: ScopeDefinition) {
        self.scopes.insert(scope.name.clone(), scope);
    }

    pub fn get(&self, name: &str) -> Result<&ScopeDefinition, BrokerError> {
        self.scopes
            .get(name)
            .ok_or_else(|| BrokerError::ScopeNotFound(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.scopes.keys().map(|k| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> RawScope {
        RawScope {
            url: Some("jdbc:oracle:thin:@db1:1521/ORCL".to_string()),
            username: Some("app_user".to_string()),
            driver_class_name: Some("oracle.jdbc.OracleDriver".to_string()),
            broker_url: Some("http://broker/query".to_string()),
            db_kind: Some(2),
            tns: Some("ORCLTNS".to_string()),
            fallback_password: Some(String::new()),
            http_timeout_ms: None,
            fallback_on_failure: false,
        }
    }

    #[test]
    fn test_complete_scope_is_registered() {
        let definition = complete().into_definition("primary").unwrap();
        assert_eq!(definition.name, "primary");
        assert_eq!(definition.db_kind, DbKind::Oracle);
        assert_eq!(definition.http_timeout, None);
        assert_eq!(definition.fallback_password, "");
    }

    #[test]
    fn test_http_timeout_override() {
        let raw = RawScope {
            http_timeout_ms: Some(2500),
            ..complete()
        };
        let definition = raw.into_definition("primary").unwrap();
        assert_eq!(definition.http_timeout, Some(Duration::from_millis(2500)));

        let raw = RawScope {
            http_timeout_ms: Some(0),
            ..complete()
        };
        assert_eq!(raw.into_definition("primary").unwrap().http_timeout, None);
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let cases = [
            (RawScope { tns: None, ..complete() }, "missing tns"),
            (RawScope { username: Some(" ".to_string()), ..complete() }, "missing username"),
            (RawScope { db_kind: None, ..complete() }, "missing db_kind"),
            (RawScope { db_kind: Some(9), ..complete() }, "unknown db_kind 9"),
            (RawScope { fallback_password: None, ..complete() }, "missing fallback_password"),
            (RawScope { broker_url: None, ..complete() }, "missing broker_url"),
        ];
        for (raw, expected) in cases {
            assert_eq!(raw.into_definition("primary").unwrap_err(), expected);
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut raw = BTreeMap::new();
        raw.insert("primary".to_string(), complete());
        raw.insert("secondary".to_string(), RawScope { tns: None, ..complete() });

        let registry = ScopeRegistry::from_raw(raw);
        assert_eq!(registry.len(), 1);
        assert!(registry.get("primary").is_ok());
        match registry.get("secondary") {
            Err(BrokerError::ScopeNotFound(name)) => assert_eq!(name, "secondary"),
            other => panic!("expected ScopeNotFound, got {:?}", other),
        }
    }
}
