//! Framework-agnostic update coalescing.
//!
//! Both primitives take `now` explicitly so hosts can drive them from
//! whatever clock their frame loop has.

use std::time::{Duration, Instant};

/// One pending slot per frame. A newer submission replaces the pending one;
/// the host drains it once per rendered frame.
#[derive(Debug)]
pub struct FrameCoalescer<T> {
    pending: Option<T>,
    submitted: u64,
    applied: u64,
}

impl<T> Default for FrameCoalescer<T> {
    fn default() -> Self {
        Self {
            pending: None,
            submitted: 0,
            applied: 0,
        }
    }
}

impl<T> FrameCoalescer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when this submission scheduled a new frame update, false
    /// when it replaced one that was already pending.
    pub fn submit(&mut self, value: T) -> bool {
        self.submitted += 1;
        self.pending.replace(value).is_none()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_mut(&mut self) -> Option<&mut T> {
        self.pending.as_mut()
    }

    pub fn take(&mut self) -> Option<T> {
        let value = self.pending.take();
        if value.is_some() {
            self.applied += 1;
        }
        value
    }

    /// (submitted, applied) since creation.
    pub fn counts(&self) -> (u64, u64) {
        (self.submitted, self.applied)
    }
}

/// Trailing debounce: only the last value pushed within `window` is released.
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.window));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// Releases the pending value regardless of the deadline (shutdown).
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalescer_keeps_latest_submission() {
        let mut c = FrameCoalescer::new();
        assert!(c.submit(1));
        assert!(!c.submit(2));
        assert!(!c.submit(3));
        assert_eq!(c.take(), Some(3));
        assert_eq!(c.take(), None);
        assert_eq!(c.counts(), (3, 1));
    }

    #[test]
    fn debouncer_releases_only_after_quiet_window() {
        let start = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(500));
        d.push("a", start);
        d.push("b", start + Duration::from_millis(200));

        assert_eq!(d.poll(start + Duration::from_millis(600)), None);
        assert_eq!(d.poll(start + Duration::from_millis(700)), Some("b"));
        assert!(!d.is_pending());
        assert_eq!(d.poll(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn debouncer_flush_ignores_deadline() {
        let now = Instant::now();
        let mut d = Debouncer::new(Duration::from_secs(10));
        d.push(7, now);
        assert_eq!(d.flush(), Some(7));
        assert_eq!(d.flush(), None);
    }
}
