//! Transport to the broker endpoint.
//!
//! - `client` - single-attempt `Transport` seam and the blocking HTTP client
//! - `retry` - bounded, backoff-free retry of whole requests

pub mod client;
pub mod retry;

pub use client::*;
pub use retry::*;
