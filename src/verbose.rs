//! Process-wide verbose gate.
//!
//! Set exactly once in `main` before any job runs, read without further
//! synchronization by the decision diagnostics.

use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::Relaxed);
}

pub fn enabled() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Print a decision diagnostic to stderr when verbose output is enabled.
#[macro_export]
macro_rules! vprintln {
    ($($arg:tt)*) => {
        if $crate::verbose::enabled() {
            eprintln!($($arg)*);
        }
    };
}
