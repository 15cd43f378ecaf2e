//! Integration tests for the engine logging system
//!
//! These tests verify the logging system functionality through the public
//! API. No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use pulsar_engine::pulsar::log::{LogEntry, Logger, LogSeverity};
use pulsar_engine::pulsar::Engine;
use pulsar_engine::{engine_info, engine_warn};
use serial_test::serial;
use std::sync::{Arc, Mutex};

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                entries: entries.clone(),
            },
            entries,
        )
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_custom_logger() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Info, "test::module", "Test info message".to_string());
    Engine::log(LogSeverity::Warn, "test::module", "Test warning message".to_string());
    Engine::log(LogSeverity::Error, "test::module", "Test error message".to_string());

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 3);

    assert_eq!(captured[0].severity, LogSeverity::Info);
    assert_eq!(captured[0].source, "test::module");
    assert_eq!(captured[0].message, "Test info message");

    assert_eq!(captured[1].severity, LogSeverity::Warn);
    assert_eq!(captured[2].severity, LogSeverity::Error);

    drop(captured);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_error_logging_with_location() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log_detailed(
        LogSeverity::Error,
        "test::error",
        "Critical error occurred".to_string(),
        "test_file.rs",
        42,
    );

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);

    let entry = &captured[0];
    assert_eq!(entry.severity, LogSeverity::Error);
    assert_eq!(entry.source, "test::error");
    assert_eq!(entry.message, "Critical error occurred");
    assert_eq!(entry.file, Some("test_file.rs"));
    assert_eq!(entry.line, Some(42));

    drop(captured);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_macros_from_dependent_crate() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    // The macros must work outside the engine crate itself, the way the
    // Vulkan backend uses them
    engine_info!("test::macros", "chain created: {} images", 3);
    engine_warn!("test::macros", "surface {}", "suboptimal");

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 2);
    assert_eq!(captured[0].severity, LogSeverity::Info);
    assert_eq!(captured[0].message, "chain created: 3 images");
    assert_eq!(captured[1].severity, LogSeverity::Warn);
    assert_eq!(captured[1].message, "surface suboptimal");

    drop(captured);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_logger_reset() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Info, "test", "Message 1".to_string());
    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 1);
    }

    Engine::reset_logger();

    // Goes to the default logger, not the captured one
    Engine::log(LogSeverity::Info, "test", "Message 2".to_string());

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
}

#[test]
#[serial]
fn test_integration_logging_different_severities() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Trace, "test", "Trace message".to_string());
    Engine::log(LogSeverity::Debug, "test", "Debug message".to_string());
    Engine::log(LogSeverity::Info, "test", "Info message".to_string());
    Engine::log(LogSeverity::Warn, "test", "Warn message".to_string());
    Engine::log(LogSeverity::Error, "test", "Error message".to_string());

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 5);
    assert_eq!(captured[0].severity, LogSeverity::Trace);
    assert_eq!(captured[1].severity, LogSeverity::Debug);
    assert_eq!(captured[2].severity, LogSeverity::Info);
    assert_eq!(captured[3].severity, LogSeverity::Warn);
    assert_eq!(captured[4].severity, LogSeverity::Error);

    drop(captured);
    Engine::reset_logger();
}
