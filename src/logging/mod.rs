//! Structured logging with request context.
//!
//! Provides a log context that puts request_id, scope and user in every
//! broker log line for easy correlation.

pub mod structured;

pub use structured::*;

/// Install the process logger if nobody else has.
pub fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_millis()
        .try_init();
}
