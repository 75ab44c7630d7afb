// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform-specific time types.
//!
//! On native platforms these come from `std::time`, on WebAssembly from
//! `web_time`. The retry engine measures wall-clock time, so [`SystemTime`]
//! is the type clocks report.

#[cfg(not(target_arch = "wasm32"))]
pub use std::time::{Duration, SystemTime};
#[cfg(target_arch = "wasm32")]
pub use web_time::{Duration, SystemTime};

/// Blocks the current thread for `duration`.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn sleep(duration: Duration) {
    std::thread::sleep(duration);
}

/// Blocks the current thread for `duration`.
///
/// The main browser thread can't park, so this spins.
#[cfg(target_arch = "wasm32")]
pub(crate) fn sleep(duration: Duration) {
    let deadline = web_time::Instant::now() + duration;
    while web_time::Instant::now() < deadline {
        std::hint::spin_loop();
    }
}
