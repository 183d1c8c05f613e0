//! Call statistics - lock-free global counters for monitoring

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicUsize, Ordering};

static COUNTERS: Lazy<Counters> = Lazy::new(Counters::default);

#[derive(Default)]
struct Counters {
    calls_made: AtomicUsize,
    exceptions_raised: AtomicUsize,
    handles_released: AtomicUsize,
    marshal_errors: AtomicUsize,
}

/// Snapshot of the generic call counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallStats {
    /// Native functions invoked through the generic convention
    pub calls_made: usize,
    /// Calls that ended with a pending script exception
    pub exceptions_raised: usize,
    /// Unclaimed handle arguments released at frame teardown
    pub handles_released: usize,
    /// Frame construction or finishing errors
    pub marshal_errors: usize,
}

#[inline]
pub(crate) fn record_call() {
    COUNTERS.calls_made.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub(crate) fn record_exception() {
    COUNTERS.exceptions_raised.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub(crate) fn record_released(count: usize) {
    if count > 0 {
        COUNTERS.handles_released.fetch_add(count, Ordering::Relaxed);
    }
}

#[inline]
pub(crate) fn record_error() {
    COUNTERS.marshal_errors.fetch_add(1, Ordering::Relaxed);
}

/// Get call statistics
pub fn stats() -> CallStats {
    CallStats {
        calls_made: COUNTERS.calls_made.load(Ordering::Relaxed),
        exceptions_raised: COUNTERS.exceptions_raised.load(Ordering::Relaxed),
        handles_released: COUNTERS.handles_released.load(Ordering::Relaxed),
        marshal_errors: COUNTERS.marshal_errors.load(Ordering::Relaxed),
    }
}
