// SPDX-License-Identifier: MIT OR Apache-2.0

//! # In-Memory Logger
//!
//! Captures every line a [`Context`](crate::Context) emits instead of writing
//! it to stderr.  This is how the crate's own tests assert on trace output,
//! and it is equally useful for attaching the trace of a failed routine to a
//! test report.
//!
//! The logger is shared with the context through an `Arc`, so the caller
//! keeps a handle to read the captured lines back.

use crate::log_record::LogRecord;
use crate::logger::Logger;
use std::sync::{Mutex, MutexGuard};

/// An in-memory logger that stores rendered log lines in a `Vec<String>`.
///
/// # Example
///
/// ```rust
/// use automation_entities::{Context, InMemoryLogger};
/// use std::sync::Arc;
///
/// let logger = Arc::new(InMemoryLogger::new());
/// let ctx = Context::builder().logger(logger.clone()).build();
///
/// ctx.log("top");
/// ctx.subcontext("block").run(|sub| sub.log("nested")).unwrap();
///
/// assert_eq!(logger.drain_logs(), "top\nblock\n    nested");
/// ```
#[derive(Debug)]
pub struct InMemoryLogger {
    logs: Mutex<Vec<String>>,
}

// ============================================================================
// BOILERPLATE TRAIT IMPLEMENTATIONS
// ============================================================================
//
// - Debug: derived, required by Logger
// - Default: empty log buffer
// - Clone: NOT implemented, share it through an Arc instead
// - PartialEq/Eq/Hash: NOT implemented, comparing mutex state is problematic

impl Default for InMemoryLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLogger {
    /// Creates a new `InMemoryLogger` with an empty log buffer.
    pub fn new() -> Self {
        Self {
            logs: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        //a panic while holding the lock can't leave a Vec<String> half-written
        self.logs.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Drains all logs into a single string joined by newlines, clearing the
    /// internal buffer.
    pub fn drain_logs(&self) -> String {
        let mut logs = self.lock();
        let result = logs.join("\n");
        logs.clear();
        result
    }

    /// Returns a copy of the captured lines without clearing them.
    pub fn lines(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Writes all captured lines to stderr, clearing the internal buffer.
    pub fn drain_to_console(&self) {
        let mut logs = self.lock();
        for log in logs.iter() {
            #[cfg(target_arch = "wasm32")]
            web_sys::console::log_1(&log.clone().into());
            #[cfg(not(target_arch = "wasm32"))]
            eprintln!("{}", log);
        }
        logs.clear();
    }
}

impl Logger for InMemoryLogger {
    fn finish_log_record(&self, record: LogRecord) {
        let log_string = record.to_string();
        self.lock().push(log_string);
    }

    fn prepare_to_die(&self) {
        // nothing is buffered outside the Vec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str) -> LogRecord {
        let mut record = LogRecord::new();
        record.log(text);
        record
    }

    #[test]
    fn drain_clears_buffer() {
        let logger = InMemoryLogger::new();
        logger.finish_log_record(record("first"));
        logger.finish_log_record(record("second"));

        assert_eq!(logger.lines(), vec!["first", "second"]);
        assert_eq!(logger.drain_logs(), "first\nsecond");
        assert_eq!(logger.drain_logs(), "");
        assert!(logger.lines().is_empty());
    }

    #[test]
    fn drain_to_console_clears_buffer() {
        let logger = InMemoryLogger::new();
        logger.finish_log_record(record("post-mortem"));
        logger.drain_to_console();
        assert!(logger.lines().is_empty());
        logger.finish_log_record(record("after"));
        assert_eq!(logger.drain_logs(), "after");
    }

    #[test]
    fn assert_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InMemoryLogger>();
    }
}
