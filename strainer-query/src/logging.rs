//! Logging setup for Strainer.
//!
//! Parsing and compilation emit `tracing` events at debug and trace level.
//! Nothing is printed unless a subscriber is installed, either by the
//! application or through [`init`] when the `tracing-subscriber` feature is on.
//!
//! # Environment Variables
//!
//! - `STRAINER_DEBUG=true|1|yes` - Enable debug logging
//! - `STRAINER_LOG_LEVEL=trace|debug|info|warn|error` - Set the level
//! - `STRAINER_LOG_FORMAT=json|pretty|compact` - Set the output format (default: json)
//!
//! ```rust,no_run
//! use strainer_query::logging;
//!
//! logging::init();
//! ```

use std::env;
use std::sync::Once;

use strainer_syntax::{LogFormat, LoggingConfig};

static INIT: Once = Once::new();

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Whether `STRAINER_DEBUG` is set to "true", "1" or "yes" (case-insensitive).
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("STRAINER_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

fn normalize_level(level: &str) -> Option<&'static str> {
    let level = level.to_lowercase();
    LEVELS.into_iter().find(|l| *l == level)
}

/// The level from `STRAINER_LOG_LEVEL`, falling back to `default`.
///
/// `STRAINER_DEBUG` raises the fallback to "debug".
pub fn get_log_level_or(default: &str) -> &'static str {
    let fallback = if is_debug_enabled() {
        "debug"
    } else {
        normalize_level(default).unwrap_or("warn")
    };

    env::var("STRAINER_LOG_LEVEL")
        .ok()
        .and_then(|level| normalize_level(&level))
        .unwrap_or(fallback)
}

/// The level from the environment, "warn" when unset.
pub fn get_log_level() -> &'static str {
    get_log_level_or("warn")
}

/// The format from `STRAINER_LOG_FORMAT`, falling back to `default`.
pub fn get_log_format_or(default: LogFormat) -> LogFormat {
    env::var("STRAINER_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            "json" => LogFormat::Json,
            _ => default,
        })
        .unwrap_or(default)
}

/// Initialize logging from the environment.
///
/// Subsequent calls are no-ops. Does nothing unless `STRAINER_DEBUG` or
/// `STRAINER_LOG_LEVEL` is set.
pub fn init() {
    if !is_debug_enabled() && env::var("STRAINER_LOG_LEVEL").is_err() {
        return;
    }
    install(get_log_level(), get_log_format_or(LogFormat::Json));
}

/// Initialize logging from a `[logging]` configuration section.
///
/// Environment variables still take precedence.
pub fn init_with_config(config: &LoggingConfig) {
    install(
        get_log_level_or(&config.level),
        get_log_format_or(config.format),
    );
}

/// Initialize logging at a specific level.
pub fn init_with_level(level: &str) {
    install(
        normalize_level(level).unwrap_or("warn"),
        get_log_format_or(LogFormat::Json),
    );
}

/// Initialize debug-level logging.
pub fn init_debug() {
    install("debug", get_log_format_or(LogFormat::Json));
}

#[cfg_attr(not(feature = "tracing-subscriber"), allow(unused_variables))]
fn install(level: &'static str, format: LogFormat) {
    INIT.call_once(|| {
        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter = EnvFilter::try_new(format!(
                "strainer={level},strainer_query={level},strainer_syntax={level}"
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            let registry = tracing_subscriber::registry().with(filter);
            let result = match format {
                LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
            };

            if result.is_ok() {
                tracing::info!(log_level = level, format = ?format, "Strainer logging initialized");
            }
        }
    });
}

/// Debug-level event, emitted only when `STRAINER_DEBUG` is enabled.
#[macro_export]
macro_rules! strainer_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            ::tracing::debug!($($arg)*);
        }
    };
}

/// Trace-level event, emitted only when `STRAINER_DEBUG` is enabled.
#[macro_export]
macro_rules! strainer_trace {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            ::tracing::trace!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level("DEBUG"), Some("debug"));
        assert_eq!(normalize_level("verbose"), None);
    }

    #[test]
    fn test_level_falls_back_to_default() {
        // SAFETY: test-only, these variables are not read elsewhere in this crate's tests
        unsafe {
            env::remove_var("STRAINER_DEBUG");
            env::remove_var("STRAINER_LOG_LEVEL");
        }
        assert!(!is_debug_enabled());
        assert_eq!(get_log_level(), "warn");
        assert_eq!(get_log_level_or("info"), "info");
        assert_eq!(get_log_level_or("loud"), "warn");
    }

    #[test]
    fn test_format_falls_back_to_default() {
        // SAFETY: see above
        unsafe {
            env::remove_var("STRAINER_LOG_FORMAT");
        }
        assert_eq!(get_log_format_or(LogFormat::Compact), LogFormat::Compact);
    }
}
