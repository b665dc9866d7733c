//! Security module.
//!
//! Keeps secrets out of error payloads and log lines.

pub mod redact;

pub use redact::*;
