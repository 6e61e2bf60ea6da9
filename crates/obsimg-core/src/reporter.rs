//! Reporter trait for dependency injection
//!
//! Lets the resolver report progress and waits without being coupled to a
//! terminal implementation.

use std::time::Duration;

pub trait Reporter: Send + Sync {
    /// A new phase has started (e.g. "Resolving", "Downloading").
    fn section(&self, title: &str);

    /// Updates the progress of a download.
    fn downloading(&self, filename: &str, current: u64, total: Option<u64>);

    /// Conditions were not met on `attempt`; the poller sleeps for `pause`.
    fn waiting(&self, attempt: u32, pause: Duration, unmet: &[String]);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn downloading(&self, filename: &str, current: u64, total: Option<u64>) {
        (**self).downloading(filename, current, total);
    }
    fn waiting(&self, attempt: u32, pause: Duration, unmet: &[String]) {
        (**self).waiting(attempt, pause, unmet);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn success(&self, msg: &str) {
        (**self).success(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
}

/// Discards everything. Default for library use and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _title: &str) {}
    fn downloading(&self, _filename: &str, _current: u64, _total: Option<u64>) {}
    fn waiting(&self, _attempt: u32, _pause: Duration, _unmet: &[String]) {}
    fn info(&self, _msg: &str) {}
    fn success(&self, _msg: &str) {}
    fn warning(&self, _msg: &str) {}
}
