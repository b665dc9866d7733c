//! Structured logging utilities.
//!
//! Every credential retrieval gets its own request id so that the attempts,
//! decode and decrypt steps of one exchange can be correlated in the logs.

use std::fmt;

use uuid::Uuid;

/// Logging context for one credential retrieval.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub request_id: String,
    pub scope: String,
    pub user: Option<String>,
}

impl LogContext {
    pub fn new(scope: &str) -> Self {
        Self {
            request_id: format!("req-{}", &Uuid::new_v4().to_string()[..8]),
            scope: scope.to_string(),
            user: None,
        }
    }

    pub fn with_user(&self, user: &str) -> Self {
        Self {
            request_id: self.request_id.clone(),
            scope: self.scope.clone(),
            user: Some(user.to_string()),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.user {
            Some(user) => write!(
                f,
                "[req={}] [scope={}] [user={}]",
                self.request_id, self.scope, user
            ),
            None => write!(f, "[req={}] [scope={}]", self.request_id, self.scope),
        }
    }
}
