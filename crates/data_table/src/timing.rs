//! Clocks and the timer-owning debounce/throttle primitives.
//!
//! Neither primitive schedules anything itself. Callers feed them the current time and ask for
//! the next deadline, which keeps them deterministic under a [`ManualClock`] and lets the browser
//! layer drive them from a single `setTimeout`.

use std::{cell::Cell, rc::Rc};
#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time in milliseconds.
pub trait Clock {
    /// Current time in milliseconds.
    fn now_ms(&self) -> u64;
}

/// Returns the current unix timestamp in milliseconds.
pub fn unix_time_ms_now() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now().max(0.0) as u64
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Wall clock backed by [`unix_time_ms_now`].
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        unix_time_ms_now()
    }
}

#[derive(Debug, Clone, Default)]
/// Hand-driven clock for tests and previews. Clones share the same time.
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    /// Creates a clock starting at `now_ms`.
    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(now_ms)),
        }
    }

    /// Sets the absolute time.
    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }

    /// Moves time forward.
    pub fn advance(&self, delta_ms: u64) {
        self.now.set(self.now.get().saturating_add(delta_ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

#[derive(Debug, Clone)]
/// Holds at most one pending value and releases it once input has been quiet for the window.
pub struct Debouncer<T> {
    window_ms: u64,
    pending: Option<(T, u64)>,
}

impl<T> Debouncer<T> {
    /// Creates a debouncer with the given quiet window.
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            pending: None,
        }
    }

    /// Replaces any pending value and restarts the window at `now_ms`.
    pub fn schedule(&mut self, value: T, now_ms: u64) {
        self.pending = Some((value, now_ms.saturating_add(self.window_ms)));
    }

    /// Drops the pending value.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Releases the pending value immediately.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    /// Releases the pending value when its deadline has passed.
    pub fn poll(&mut self, now_ms: u64) -> Option<T> {
        if self.deadline().is_some_and(|due| due <= now_ms) {
            self.flush()
        } else {
            None
        }
    }

    /// Deadline of the pending value.
    pub fn deadline(&self) -> Option<u64> {
        self.pending.as_ref().map(|(_, due)| *due)
    }

    /// Whether a value is waiting.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// At-most-once-per-window gate with optional leading and trailing edges.
pub struct ThrottleGate {
    window_ms: u64,
    leading: bool,
    trailing: bool,
    last_fire: Option<u64>,
    trailing_due: Option<u64>,
}

impl ThrottleGate {
    /// Creates a gate. With neither edge enabled, inputs only fire once a window has elapsed.
    pub fn new(window_ms: u64, leading: bool, trailing: bool) -> Self {
        Self {
            window_ms,
            leading,
            trailing,
            last_fire: None,
            trailing_due: None,
        }
    }

    fn window_open(&self, now_ms: u64) -> bool {
        self.last_fire
            .map_or(true, |last| now_ms >= last.saturating_add(self.window_ms))
    }

    /// Registers an input. Returns `true` when the caller should fire now.
    pub fn on_input(&mut self, now_ms: u64) -> bool {
        let window_open = self.window_open(now_ms);
        if window_open && (self.leading || !self.trailing) {
            self.last_fire = Some(now_ms);
            self.trailing_due = None;
            return true;
        }
        if self.trailing && self.trailing_due.is_none() {
            let due = match self.last_fire {
                Some(last) if !window_open => last.saturating_add(self.window_ms),
                _ => now_ms.saturating_add(self.window_ms),
            };
            self.trailing_due = Some(due);
        }
        false
    }

    /// Returns `true` when a trailing fire is due.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.trailing_due {
            Some(due) if due <= now_ms => {
                self.trailing_due = None;
                self.last_fire = Some(now_ms);
                true
            }
            _ => false,
        }
    }

    /// Deadline of the pending trailing fire.
    pub fn deadline(&self) -> Option<u64> {
        self.trailing_due
    }

    /// Throttle window length.
    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// End of the current window, or `None` before the first fire.
    pub fn window_end(&self) -> Option<u64> {
        self.last_fire
            .map(|last| last.saturating_add(self.window_ms))
    }

    /// Records a fire made outside [`ThrottleGate::on_input`] and [`ThrottleGate::poll`].
    pub fn record_fire(&mut self, now_ms: u64) {
        self.last_fire = Some(now_ms);
        self.trailing_due = None;
    }
}

/// Earliest of two optional deadlines.
pub fn earliest(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn debouncer_releases_only_the_last_value_after_quiet_window() {
        let mut debouncer = Debouncer::new(300);
        debouncer.schedule("admin", 0);
        debouncer.schedule("a", 50);
        debouncer.schedule("admin", 100);

        assert_eq!(debouncer.deadline(), Some(400));
        assert_eq!(debouncer.poll(399), None);
        assert_eq!(debouncer.poll(400), Some("admin"));
        assert_eq!(debouncer.poll(1_000), None);
    }

    #[test]
    fn debouncer_cancel_and_flush() {
        let mut debouncer = Debouncer::new(300);
        debouncer.schedule(1, 0);
        debouncer.cancel();
        assert!(!debouncer.is_pending());
        debouncer.schedule(2, 0);
        assert_eq!(debouncer.flush(), Some(2));
        assert_eq!(debouncer.deadline(), None);
    }

    #[test]
    fn throttle_fires_leading_then_trailing_once_per_window() {
        let mut gate = ThrottleGate::new(50, true, true);
        assert!(gate.on_input(0));
        assert!(!gate.on_input(10));
        assert!(!gate.on_input(20));
        assert_eq!(gate.deadline(), Some(50));
        assert!(!gate.poll(49));
        assert!(gate.poll(50));
        assert!(!gate.poll(60));
        assert!(gate.on_input(100));
    }

    #[test]
    fn trailing_only_throttle_defers_first_input() {
        let mut gate = ThrottleGate::new(50, false, true);
        assert!(!gate.on_input(0));
        assert_eq!(gate.deadline(), Some(50));
        assert!(gate.poll(50));
    }

    #[test]
    fn leading_only_throttle_drops_inputs_inside_window() {
        let mut gate = ThrottleGate::new(50, true, false);
        assert!(gate.on_input(0));
        assert!(!gate.on_input(10));
        assert_eq!(gate.deadline(), None);
        assert!(gate.on_input(60));
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::starting_at(5);
        let other = clock.clone();
        clock.advance(10);
        assert_eq!(other.now_ms(), 15);
        assert_eq!(earliest(Some(3), None), Some(3));
        assert_eq!(earliest(Some(3), Some(2)), Some(2));
    }
}
