#![deny(missing_docs)]
//! Logging macros shared by the partscout crates.
//!
//! `scout_core` stays free of logger setup and only emits through these macros;
//! the binary decides where the records go. Tests call [`initialize_for_tests`].

/// Trace-level record, forwarded to `log::trace!`.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Info-level record, forwarded to `log::info!`.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Debug-level record, forwarded to `log::debug!`.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Warning record, forwarded to `log::warn!`.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Error record, forwarded to `log::error!`.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Sends test logs to stderr, skipping HTTP internals.
///
/// Safe to call from every test; only the first call installs a logger.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let config = ConfigBuilder::new()
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .build();

    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        config,
        TerminalMode::Stderr,
        ColorChoice::Never,
    )]);
}
