//! Log output for the `assay` binary.
//!
//! Library crates only emit `tracing` events; this is the one place a
//! subscriber is installed. Logs go to stderr next to the diagnostics.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

/// Verbosity selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Warn,
}

impl LogLevel {
    /// `-v` / `--verbose` turns on debug output.
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Warn => tracing::Level::WARN,
        }
    }
}

pub fn init_with_level(level: LogLevel) {
    let filter = tracing_subscriber::filter::LevelFilter::from_level(level.into());

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .with_level(true)
        .with_ansi(false)
        .compact()
        .with_filter(filter);

    // A second initialisation keeps the first subscriber.
    let _ = Registry::default().with(layer).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_selects_debug() {
        assert_eq!(LogLevel::from_verbose(true), LogLevel::Debug);
        assert_eq!(LogLevel::from_verbose(false), LogLevel::Warn);
        assert_eq!(tracing::Level::from(LogLevel::Warn), tracing::Level::WARN);
    }
}
