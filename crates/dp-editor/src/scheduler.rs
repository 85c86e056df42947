//! Cooperative scheduling helpers.
//!
//! The pad never owns a timer. Hosts call `poll()` from whatever loop they
//! have (`setInterval`, a replay script, a test) and these helpers decide
//! from wall-clock time whether anything is due.

/// Trailing-edge debouncer: keeps only the latest value and releases it
/// once `delay_ms` has passed without a newer one.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay_ms: f64,
    pending: Option<(T, f64)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: f64) -> Self {
        Self {
            delay_ms: delay_ms.max(0.0),
            pending: None,
        }
    }

    /// Replace any pending value; the quiet period restarts at `now_ms`.
    pub fn push(&mut self, now_ms: f64, value: T) {
        self.pending = Some((value, now_ms + self.delay_ms));
    }

    /// When the pending value becomes due.
    pub fn due_at(&self) -> Option<f64> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// Take the pending value if its quiet period is over.
    pub fn poll(&mut self, now_ms: f64) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now_ms >= *at => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// Take the pending value immediately.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }
}
