//! Bounded retry of broker exchanges.
//!
//! Every failed attempt re-sends the whole request immediately. There is no
//! backoff and no cancellation between attempts, so one call can block for
//! `max_attempts` times the per-attempt timeout.

use std::time::Duration;

use crate::error::{AttemptError, TransportError};
use crate::logging::structured::LogContext;

use super::client::Transport;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    /// `max_attempts` below 1 is treated as 1.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

/// Send `body` to `endpoint`, retrying transport failures up to the policy's
/// attempt limit. Returns the first successful response body.
pub fn send_with_retry(
    transport: &dyn Transport,
    policy: &RetryPolicy,
    endpoint: &str,
    body: &str,
    timeout: Duration,
    ctx: &LogContext,
) -> Result<String, TransportError> {
    let mut last: Option<AttemptError> = None;

    for attempt in 1..=policy.max_attempts() {
        log::debug!(
            "{} BROKER_ATTEMPT attempt={}/{} endpoint={}",
            ctx,
            attempt,
            policy.max_attempts(),
            endpoint
        );

        match transport.send(endpoint, body, timeout) {
            Ok(response) => {
                if attempt > 1 {
                    log::info!(
                        "{} BROKER_ATTEMPT_RECOVERED attempt={}/{}",
                        ctx,
                        attempt,
                        policy.max_attempts()
                    );
                }
                return Ok(response);
            }
            Err(e) => {
                log::warn!(
                    "{} BROKER_ATTEMPT_FAILED attempt={}/{} endpoint={} error={}",
                    ctx,
                    attempt,
                    policy.max_attempts(),
                    endpoint,
                    e
                );
                last = Some(e);
            }
        }
    }

    let last = last.unwrap_or_else(|| AttemptError::Request("no attempt made".to_string()));
    log::error!(
        "{} BROKER_UNREACHABLE attempts={} error={}",
        ctx,
        policy.max_attempts(),
        last
    );
    Err(TransportError {
        attempts: policy.max_attempts(),
        last,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedTransport;

    fn ctx() -> LogContext {
        LogContext::new("test")
    }

    fn send(transport: &ScriptedTransport, policy: RetryPolicy) -> Result<String, TransportError> {
        send_with_retry(
            transport,
            &policy,
            "http://broker/query",
            "<operation_in/>",
            Duration::from_secs(1),
            &ctx(),
        )
    }

    #[test]
    fn test_first_success_is_returned_without_retry() {
        let transport = ScriptedTransport::new(vec![Ok("<ok/>".to_string())]);
        assert_eq!(send(&transport, RetryPolicy::default()).unwrap(), "<ok/>");
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_fails_twice_then_succeeds_on_third_attempt() {
        let transport = ScriptedTransport::new(vec![
            Err(AttemptError::Connect("refused".to_string())),
            Err(AttemptError::Timeout("read".to_string())),
            Ok("<ok/>".to_string()),
        ]);
        assert_eq!(send(&transport, RetryPolicy::default()).unwrap(), "<ok/>");
        assert_eq!(transport.calls(), 3);
    }

    #[test]
    fn test_three_failures_surface_last_error_and_stop() {
        let transport = ScriptedTransport::new(vec![
            Err(AttemptError::Connect("refused".to_string())),
            Err(AttemptError::Status(500)),
            Err(AttemptError::Timeout("read".to_string())),
            Ok("<never/>".to_string()),
        ]);
        let err = send(&transport, RetryPolicy::default()).unwrap_err();
        assert_eq!(
            err,
            TransportError {
                attempts: 3,
                last: AttemptError::Timeout("read".to_string()),
            }
        );
        assert_eq!(transport.calls(), 3);
    }

    #[test]
    fn test_every_attempt_resends_the_same_request() {
        let transport = ScriptedTransport::new(vec![
            Err(AttemptError::Status(502)),
            Ok("<ok/>".to_string()),
        ]);
        send(&transport, RetryPolicy::default()).unwrap();
        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent
            .iter()
            .all(|(endpoint, body)| endpoint == "http://broker/query" && body == "<operation_in/>"));
    }

    #[test]
    fn test_policy_clamps_to_one_attempt() {
        assert_eq!(RetryPolicy::new(0).max_attempts(), 1);
        let transport = ScriptedTransport::new(vec![Err(AttemptError::Status(500))]);
        let err = send(&transport, RetryPolicy::new(0)).unwrap_err();
        assert_eq!(err.attempts, 1);
        assert_eq!(transport.calls(), 1);
    }
}
