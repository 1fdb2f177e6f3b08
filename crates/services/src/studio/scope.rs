use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Liveness flag shared by everything a learning session owns.
///
/// Once closed, late completions must leave session state untouched.
#[derive(Clone, Debug, Default)]
pub(crate) struct SessionScope {
    closed: Arc<AtomicBool>,
}

impl SessionScope {
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub(crate) fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }
}
