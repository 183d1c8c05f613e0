//! Logging infrastructure - structured tracing for the marshalling layer
//!
//! Design: uses `tracing` for structured, contextual logging with:
//! - Per-module filtering through `EnvFilter` (`RUST_LOG` wins when set)
//! - Zero cost when disabled
//! - Console or file output, human-readable or JSON

use once_cell::sync::OnceCell;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

pub use tracing::{debug, error, info, trace, warn, Level};

static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Keeps the non-blocking file writer flushing for the process lifetime
static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level
    pub level: Level,
    /// Enable file logging
    pub file_output: bool,
    /// Log file path (if file_output enabled)
    pub log_path: Option<String>,
    /// Enable JSON format (vs human-readable)
    pub json_format: bool,
    /// Show span events (enter/exit)
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file_output: false,
            log_path: None,
            json_format: false,
            show_spans: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // GENCALL_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level_str) = std::env::var("GENCALL_LOG_LEVEL") {
            config.level = level_str.parse().unwrap_or(Level::INFO);
        }

        // GENCALL_LOG_FILE: path to log file
        if let Ok(path) = std::env::var("GENCALL_LOG_FILE") {
            config.file_output = true;
            config.log_path = Some(path);
        }

        config.json_format = std::env::var("GENCALL_LOG_JSON").is_ok();
        config.show_spans = std::env::var("GENCALL_LOG_SPANS").is_ok();

        config
    }

    /// Verbose config for debugging marshalling issues
    pub fn debug() -> Self {
        Self {
            level: Level::TRACE,
            file_output: false,
            log_path: None,
            json_format: false,
            show_spans: true,
        }
    }
}

/// Initialize logging with configuration from the environment
pub fn init() {
    init_with_config(LogConfig::from_env());
}

/// Initialize logging with custom configuration (first call wins)
pub fn init_with_config(config: LogConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("gencall={}", config.level.as_str().to_lowercase()))
        });

        let span_events = if config.show_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let file_writer = config
            .log_path
            .as_deref()
            .filter(|_| config.file_output)
            .map(|path| {
                let path = Path::new(path);
                let dir = path.parent().unwrap_or_else(|| Path::new("."));
                let name = path.file_name().unwrap_or(path.as_os_str());
                let (writer, guard) =
                    tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
                let _ = FILE_GUARD.set(guard);
                writer
            });

        let layer = match (file_writer, config.json_format) {
            (Some(writer), true) => fmt::layer()
                .json()
                .with_writer(writer)
                .with_span_events(span_events)
                .boxed(),
            (Some(writer), false) => fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_span_events(span_events)
                .boxed(),
            (None, true) => fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_span_events(span_events)
                .boxed(),
            (None, false) => fmt::layer()
                .with_writer(io::stderr)
                .with_span_events(span_events)
                .with_target(true)
                .with_line_number(cfg!(debug_assertions))
                .boxed(),
        };

        // Another subscriber may already be installed by the embedder
        tracing_subscriber::registry()
            .with(layer.with_filter(env_filter))
            .try_init()
            .ok();
    });
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

// ============================================================================
// Marshalling-specific logging functions
// ============================================================================

/// Log a generic call entering the native function
#[inline]
pub fn log_generic_call(function: &str, arg_count: usize) {
    debug!(
        event = "generic_call",
        function = function,
        args = arg_count,
        "Generic function called"
    );
}

/// Log a generic call returning normally
#[inline]
pub fn log_generic_return(function: &str) {
    trace!(
        event = "generic_return",
        function = function,
        "Generic function returned"
    );
}

/// Log a script exception raised by a native function
pub fn log_script_exception(function: &str, message: &str) {
    debug!(
        event = "script_exception",
        function = function,
        message = message,
        "Native function set an exception"
    );
}

/// Log a recoverable contract violation by a native function
pub fn log_protocol_warning(function: &str, warning: &str) {
    warn!(
        event = "protocol_warning",
        function = function,
        warning = warning,
        "Generic calling convention misuse"
    );
}

/// Log frame teardown
#[inline]
pub fn log_frame_teardown(function: &str, released_handles: usize) {
    trace!(
        event = "frame_teardown",
        function = function,
        released_handles = released_handles,
        "Call frame torn down"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = LogConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.file_output);

        let debug_config = LogConfig::debug();
        assert_eq!(debug_config.level, Level::TRACE);
        assert!(debug_config.show_spans);
    }

    #[test]
    fn test_init_idempotent() {
        init();
        init(); // Should not panic
        assert!(is_initialized());
    }
}
