//! Internal logging system for the Pulsar engine
//!
//! This module provides a flexible logging system with:
//! - Customizable logger via Logger trait
//! - Severity levels (Trace, Debug, Info, Warn, Error)
//! - Colored console output by default
//! - Thread-safe logging with RwLock
//! - File and line information for detailed ERROR logs

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// Implement this trait to create custom loggers (file logging, network logging, etc.)
///
/// # Example
///
/// ```no_run
/// use pulsar_engine::pulsar::log::{Logger, LogEntry};
///
/// struct FileLogger {
///     file: std::fs::File,
/// }
///
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    ///
    /// # Arguments
    ///
    /// * `entry` - The log entry to process
    fn log(&self, entry: &LogEntry);
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level (Trace, Debug, Info, Warn, Error)
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source module (e.g., "pulsar::FrameOrchestrator", "pulsar::vulkan::SwapChain")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for detailed ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for detailed ERROR logs)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Very verbose debug information (typically disabled in release)
    Trace,

    /// Development/debugging information
    Debug,

    /// Important informational messages
    Info,

    /// Warning messages (potential issues)
    Warn,

    /// Error messages (critical issues with file:line details)
    Error,
}

/// Default logger implementation using colored console output
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Error: `[timestamp] [ERROR] [source] message (file:line)`
pub struct DefaultLogger;

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        // Format timestamp as YYYY-MM-DD HH:MM:SS.mmm
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        // Color severity string
        let severity_str = match entry.severity {
            LogSeverity::Trace => "TRACE".bright_black(),
            LogSeverity::Debug => "DEBUG".cyan(),
            LogSeverity::Info => "INFO ".green(),
            LogSeverity::Warn => "WARN ".yellow(),
            LogSeverity::Error => "ERROR".red().bold(),
        };

        // Color source
        let source = entry.source.bright_blue();

        // Print with or without file:line
        if let (Some(file), Some(line)) = (entry.file, entry.line) {
            println!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp,
                severity_str,
                source,
                entry.message,
                file,
                line
            );
        } else {
            println!(
                "[{}] [{}] [{}] {}",
                timestamp,
                severity_str,
                source,
                entry.message
            );
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message (very verbose, typically disabled)
///
/// # Example
///
/// ```no_run
/// # use pulsar_engine::engine_trace;
/// engine_trace!("pulsar::FrameOrchestrator", "Entering begin_frame()");
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::pulsar::Engine::log(
            $crate::pulsar::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message (development information)
///
/// # Example
///
/// ```no_run
/// # use pulsar_engine::engine_debug;
/// # let id = 0u32;
/// engine_debug!("pulsar::Scene", "Spawned object {}", id);
/// ```
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::pulsar::Engine::log(
            $crate::pulsar::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message (important events)
///
/// # Example
///
/// ```no_run
/// # use pulsar_engine::engine_info;
/// engine_info!("pulsar::FrameOrchestrator", "Swapchain recreated");
/// ```
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::pulsar::Engine::log(
            $crate::pulsar::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message (potential issues)
///
/// # Example
///
/// ```no_run
/// # use pulsar_engine::engine_warn;
/// engine_warn!("pulsar::FrameOrchestrator", "Suboptimal swapchain, recreating");
/// ```
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::pulsar::Engine::log(
            $crate::pulsar::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
///
/// # Example
///
/// ```no_run
/// # use pulsar_engine::engine_error;
/// # let error = "device lost";
/// engine_error!("pulsar::FrameOrchestrator", "Failed to submit: {}", error);
/// ```
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::pulsar::Engine::log_detailed(
            $crate::pulsar::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an ERROR message and evaluate to the given error value
///
/// Convenience for the common `log the failure, then build the Error` pattern:
///
/// ```no_run
/// # use pulsar_engine::engine_err;
/// # use pulsar_engine::pulsar::{Error, Result};
/// # fn pick_format() -> Result<()> {
/// return Err(engine_err!(
///     "pulsar::vulkan::SwapChain",
///     Error::SwapchainCreation,
///     "no suitable surface format"
/// ));
/// # }
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $variant:path, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::pulsar::Engine::log_detailed(
            $crate::pulsar::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $variant(message)
    }};
}

/// Log an ERROR message and return early with the given error
///
/// # Example
///
/// ```no_run
/// # use pulsar_engine::engine_bail;
/// # use pulsar_engine::pulsar::{Error, Result};
/// # fn find_queue_family() -> Result<()> {
/// engine_bail!(
///     "pulsar::vulkan::Context",
///     Error::InitializationFailed,
///     "no graphics queue family found"
/// );
/// # }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $variant:path, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $variant, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
