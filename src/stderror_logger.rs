// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::log_record::LogRecord;
use crate::logger::Logger;

/**
The default logger.  Writes one line per record to stderr.
 */
#[derive(Debug, Clone)]
pub struct StdErrorLogger {}

// ============================================================================
// BOILERPLATE TRAIT IMPLEMENTATIONS
// ============================================================================
//
// - Debug/Clone: derived, zero-sized
// - Copy/PartialEq/Eq/Hash: implemented, all instances are equivalent
// - Default: implemented, zero-argument constructor
// - Display: no meaningful string representation

impl Copy for StdErrorLogger {}

impl PartialEq for StdErrorLogger {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for StdErrorLogger {}

impl std::hash::Hash for StdErrorLogger {
    fn hash<H: std::hash::Hasher>(&self, _state: &mut H) {}
}

impl Default for StdErrorLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl StdErrorLogger {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Logger for StdErrorLogger {
    fn finish_log_record(&self, record: LogRecord) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            use std::io::Write;
            let mut lock = std::io::stderr().lock();
            for part in record.parts {
                //write failures on stderr are ignored
                let _ = lock.write_all(part.as_bytes());
            }
            let _ = lock.write_all(b"\n");
        }
        #[cfg(target_arch = "wasm32")]
        {
            let msg = record.parts.join("");
            web_sys::console::log_1(&msg.into());
        }
    }

    fn prepare_to_die(&self) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            use std::io::Write;
            let _ = std::io::stderr().flush();
        }
    }
}
