//SPDX-License-Identifier: MIT OR Apache-2.0
use crate::log_record::LogRecord;
use std::fmt::Debug;

/// A destination for the lines a [`Context`](crate::Context) emits.
pub trait Logger: Debug + Send + Sync {
    /**
        Submits the log record for logging.
    */
    fn finish_log_record(&self, record: LogRecord);

    /**
    The application may imminently exit.  Ensure all buffers are flushed and up to date.
    */
    fn prepare_to_die(&self);
}

/*
Boilerplate notes.

# Logger

Clone doesn't make sense for something that may own a file handle or buffer.
PartialEq/Eq/Hash: unclear whether that means data or provenance, so no.
Default: depends on how the logger is constructed.
Send/Sync are required so one logger can be shared between contexts on different threads.
*/

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Discards records and counts flushes.
    #[derive(Debug, Default)]
    pub(crate) struct FlushCounter {
        flushes: AtomicUsize,
    }

    impl FlushCounter {
        pub(crate) fn flushes(&self) -> usize {
            self.flushes.load(Ordering::Relaxed)
        }
    }

    impl Logger for FlushCounter {
        fn finish_log_record(&self, _record: LogRecord) {}

        fn prepare_to_die(&self) {
            self.flushes.fetch_add(1, Ordering::Relaxed);
        }
    }
}
