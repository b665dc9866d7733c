//! Broker wire protocol.
//!
//! Both directions use the same two-level XML envelope:
//! `root > content > flat list of named leaf elements`, UTF-8, no attributes.
//! - `envelope` - generic reader/writer for that shape
//! - `codec` - mapping between envelopes and request/response types

pub mod codec;
pub mod envelope;

pub use codec::*;
pub use envelope::*;
