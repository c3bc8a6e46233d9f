// Long-press bookkeeping: the timer token handed out by the host and the
// jitter rule that turns "touch, hold, then move" into a pan.
use gloo::timers::callback::Timeout;

use crate::model::Point;

/// Movement (screen units) that separates a held tap from an intentional drag.
pub const JITTER_THRESHOLD: f64 = 10.0;
pub const DEFAULT_LONG_PRESS_MS: u32 = 600;

/// Opaque handle returned when a long-press timer is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingLongPress {
    pub token: TimerToken,
    /// Absolute screen point of the initial contact.
    pub start: Point,
}

impl PendingLongPress {
    pub fn exceeded_by(&self, p: Point, threshold: f64) -> bool {
        self.start.distance_to(p) > threshold
    }
}

/// Single pending-timer slot. Only one long press can be pending per
/// session, so arming replaces (and thereby drops) whatever was there.
/// `H` is the live timer handle; dropping it must cancel the timer.
pub struct TimerSlot<H> {
    next: u64,
    slot: Option<(TimerToken, H)>,
}

/// Dropping a gloo `Timeout` clears the browser timeout.
pub type BrowserTimers = TimerSlot<Timeout>;

impl<H> Default for TimerSlot<H> {
    fn default() -> Self {
        Self { next: 0, slot: None }
    }
}

impl<H> TimerSlot<H> {
    /// `make` receives the new token and starts the timer.
    pub fn arm(&mut self, make: impl FnOnce(TimerToken) -> H) -> TimerToken {
        self.next = self.next.wrapping_add(1);
        let token = TimerToken(self.next);
        self.slot = Some((token, make(token)));
        token
    }

    /// Cancelling a fired, replaced or unknown token is a no-op.
    pub fn cancel(&mut self, token: TimerToken) {
        if self.pending() == Some(token) {
            self.slot = None;
        }
    }

    pub fn pending(&self) -> Option<TimerToken> {
        self.slot.as_ref().map(|(t, _)| *t)
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}
