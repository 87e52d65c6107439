//! Delayed work with last-event-wins semantics.
//!
//! Nothing here sleeps or spawns: callers pass the current `Instant` in and
//! poll for due work, so the event loop stays single-threaded and tests can
//! drive time by hand.

use std::time::{Duration, Instant};

/// A single-slot delayed task. Scheduling again replaces whatever was pending.
#[derive(Debug, Clone)]
pub struct Timer<T> {
    slot: Option<(T, Instant)>,
}

impl<T> Default for Timer<T> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<T> Timer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, value: T, now: Instant, delay: Duration) {
        self.slot = Some((value, now + delay));
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.slot.take().map(|(v, _)| v)
    }

    pub fn is_armed(&self) -> bool {
        self.slot.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.slot.as_ref().map(|(_, at)| *at)
    }

    pub fn peek(&self) -> Option<&T> {
        self.slot.as_ref().map(|(v, _)| v)
    }

    /// Takes the value once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.deadline().is_some_and(|at| at <= now) {
            self.cancel()
        } else {
            None
        }
    }
}

/// Emits a value only after `quiet` has passed without a newer one.
/// Values equal to the previous input are ignored.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    timer: Timer<T>,
    last_input: Option<T>,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            timer: Timer::new(),
            last_input: None,
        }
    }

    /// Feeds a new input and restarts the quiet period. Returns false when the
    /// input repeats the previous one and was ignored.
    pub fn push(&mut self, value: T, now: Instant) -> bool {
        if self.last_input.as_ref() == Some(&value) {
            return false;
        }
        self.last_input = Some(value.clone());
        self.timer.schedule(value, now, self.quiet);
        true
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        self.timer.poll(now)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_armed()
    }

    /// Drops pending output and forgets the last input.
    pub fn reset(&mut self) {
        self.timer.cancel();
        self.last_input = None;
    }
}

/// Earliest of a set of optional deadlines.
pub fn earliest(deadlines: impl IntoIterator<Item = Option<Instant>>) -> Option<Instant> {
    deadlines.into_iter().flatten().min()
}
