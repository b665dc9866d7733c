//! Fakes shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::AttemptError;
use crate::transport::Transport;

/// Transport that replays a fixed script of attempt outcomes and records
/// everything it was asked to send.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<String, AttemptError>>>,
    calls: AtomicUsize,
    sent: Mutex<Vec<(String, String)>>,
    timeouts: Mutex<Vec<Duration>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<String, AttemptError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            timeouts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(endpoint, body)` of every attempt, in order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }

    pub fn timeouts(&self) -> Vec<Duration> {
        self.timeouts.lock().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, endpoint: &str, body: &str, timeout: Duration) -> Result<String, AttemptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().push((endpoint.to_string(), body.to_string()));
        self.timeouts.lock().push(timeout);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(AttemptError::Request("script exhausted".to_string())))
    }
}

/// Transport that answers every attempt with a closure.
pub struct FnTransport<F> {
    respond: F,
}

impl<F> FnTransport<F>
where
    F: Fn(&str, &str) -> Result<String, AttemptError> + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self { respond }
    }
}

impl<F> Transport for FnTransport<F>
where
    F: Fn(&str, &str) -> Result<String, AttemptError> + Send + Sync,
{
    fn send(&self, endpoint: &str, body: &str, _timeout: Duration) -> Result<String, AttemptError> {
        (self.respond)(endpoint, body)
    }
}
