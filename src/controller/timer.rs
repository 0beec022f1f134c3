use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    SelectionDebounce,
    AutoHide,
}

/// Generation-stamped handle for one scheduled firing. Stale tokens are
/// silently ignored when delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken {
    kind: TimerKind,
    generation: u64,
}

impl TimerToken {
    pub fn kind(&self) -> TimerKind {
        self.kind
    }
}

/// What the host owes the controller: call `on_timer(token)` once `delay`
/// has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerRequest {
    pub token: TimerToken,
    pub delay: Duration,
}

/// One cancellable timer. Scheduling invalidates every earlier token of the
/// same slot, so at most one pending firing exists per slot and a later
/// scheduling always wins over an earlier one.
#[derive(Debug)]
pub struct TimerSlot {
    kind: TimerKind,
    generation: u64,
    armed: bool,
}

impl TimerSlot {
    pub const fn new(kind: TimerKind) -> Self {
        Self {
            kind,
            generation: 0,
            armed: false,
        }
    }

    pub fn schedule(&mut self, delay: Duration) -> TimerRequest {
        self.generation += 1;
        self.armed = true;
        TimerRequest {
            token: TimerToken {
                kind: self.kind,
                generation: self.generation,
            },
            delay,
        }
    }

    pub fn cancel(&mut self) {
        self.armed = false;
    }

    /// Consumes the pending firing if `token` is the latest one issued.
    pub fn try_fire(&mut self, token: TimerToken) -> bool {
        if self.armed && token.kind == self.kind && token.generation == self.generation {
            self.armed = false;
            true
        } else {
            false
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}
