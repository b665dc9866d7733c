//! Local host identity.
//!
//! Resolves the machine's name and address once per process. Both values are
//! advisory metadata for the broker and may be empty.

pub mod identity;

pub use identity::*;
