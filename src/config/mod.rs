//! Broker configuration.
//!
//! - `settings` - broker identity, transport and cipher settings
//! - `registry` - named scope definitions loaded from configuration

pub mod registry;
pub mod settings;

pub use registry::*;
pub use settings::*;
