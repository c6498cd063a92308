//! # Debugging and Logging Utilities
//!
//! Conditional logging and timing helpers for the compiler pipeline,
//! gated by environment variables.

use std::time::Instant;

/// Checks if debug logging is active.
///
/// Debugging is enabled when the `WHACKY_DEBUG` environment variable is set
/// or when compiled with `debug_assertions`.
pub fn is_debug_enabled() -> bool {
    std::env::var("WHACKY_DEBUG").is_ok() || cfg!(debug_assertions)
}

/// Checks if performance tracking is active (`WHACKY_VERBOSE`).
pub fn is_perf_enabled() -> bool {
    std::env::var("WHACKY_VERBOSE").is_ok()
}

// --- Conditional Logging Functions ---

/// Logs a lexer-phase message when debug mode is active.
pub fn log_lexer(msg: &str) {
    if is_debug_enabled() {
        println!("🔍 LEXER: {}", msg);
    }
}

/// Logs a parser-phase message when debug mode is active.
pub fn log_parser(msg: &str) {
    if is_debug_enabled() {
        println!("🔍 PARSER: {}", msg);
    }
}

/// Logs a codegen-phase message when debug mode is active.
pub fn log_codegen(msg: &str) {
    if is_debug_enabled() {
        println!("🔍 CODEGEN: {}", msg);
    }
}

/// Logs a driver-level message when debug mode is active.
pub fn log_compiler(msg: &str) {
    if is_debug_enabled() {
        println!("🔍 COMPILER: {}", msg);
    }
}

// --- Performance Tracking ---

/// A simple timer for one pipeline stage.
///
/// Usage: `let timer = PerfTimer::new("codegen"); ... timer.finish();`
pub struct PerfTimer {
    start: Instant,
    label: String,
}

impl PerfTimer {
    pub fn new(label: &str) -> Self {
        Self {
            start: Instant::now(),
            label: label.to_string(),
        }
    }

    /// Stops the timer and prints the elapsed time if performance tracking
    /// is active.
    pub fn finish(self) {
        if is_perf_enabled() {
            let duration = self.start.elapsed();
            println!("⏱️  {}: {:?}", self.label, duration);
        }
    }
}
