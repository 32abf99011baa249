//! Process-wide tracing setup shared by every binary.

pub mod tracing;

pub use crate::tracing::LogFormat;

/// Install the global subscriber using `RUST_LOG` and `LOG_FORMAT`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    tracing::init(LogFormat::from_env());
}
