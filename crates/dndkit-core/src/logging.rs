#![forbid(unsafe_code)]

//! Logging support.
//!
//! With the `tracing` feature enabled, `core_log!` forwards to the matching
//! `tracing` macro under the [`LOG_TARGET`] target. Without the feature the
//! macro expands to nothing, so call sites compile unchanged and cost nothing.

/// Target used for every event emitted by this crate.
pub const LOG_TARGET: &str = "dndkit_core";

#[cfg(feature = "tracing")]
#[doc(hidden)]
pub use tracing as __tracing;

/// Emit a log event at the given level (`trace`, `debug`, `info`, `warn`,
/// `error`).
///
/// ```ignore
/// core_log!(debug, count = roots.len(), "resolving scroll ancestors");
/// ```
#[cfg(feature = "tracing")]
macro_rules! core_log {
    ($level:ident, $($arg:tt)+) => {
        $crate::logging::__tracing::$level!(target: $crate::logging::LOG_TARGET, $($arg)+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! core_log {
    ($level:ident, $($arg:tt)+) => {};
}
