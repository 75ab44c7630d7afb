// SPDX-License-Identifier: MIT OR Apache-2.0

//! Log record type.
//!
//! A [`LogRecord`] is one line of diagnostic output. Parts are appended
//! progressively (indentation first, then the message) and only joined when
//! a [`Logger`](crate::Logger) renders the record.
//!
//! ```rust
//! use automation_entities::LogRecord;
//!
//! let mut record = LogRecord::new();
//! record.log("    ");
//! record.log_owned(format!("Return: {:?}", 42));
//! assert_eq!(record.to_string(), "    Return: 42");
//! ```

use std::fmt::Display;

/**
A log record.

Records are built on the thread doing the logging and then handed, by value,
to the context's logger.  Each record renders as exactly one line; the
trailing newline is the logger's business.
*/
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LogRecord {
    pub(crate) parts: Vec<String>,
}

impl LogRecord {
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /**
    Append the message to the record.
    */
    pub fn log(&mut self, message: &str) {
        self.parts.push(message.to_string());
    }

    /**
    Append the message to the record, taking ownership of the message.
    */
    pub fn log_owned(&mut self, message: String) {
        self.parts.push(message);
    }

    /// The parts appended so far, in order.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }
}

impl Display for LogRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for part in &self.parts {
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}
/*
Boilerplate notes for LogRecord:

- Clone/PartialEq/Eq/Hash: derived, records are plain data
- Default: an empty record
- Display: the concatenated parts, which is the line a logger emits
- Copy: no, heap data
- Ord: no meaningful ordering
*/
