//! Credential broker orchestration.
//!
//! - `state` - identity fixed once at initialization
//! - `service` - `CredentialBroker`, the retrieval entry points

pub mod service;
pub mod state;

pub use service::*;
pub use state::*;
