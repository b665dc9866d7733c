//! Data model threaded through the broker.
//!
//! - `request` - outbound credential request and its enums
//! - `response` - parsed broker response and result-code polarity
//! - `scope` - static per-database scope definitions

pub mod request;
pub mod response;
pub mod scope;

pub use request::*;
pub use response::*;
pub use scope::*;
