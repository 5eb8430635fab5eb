use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct ControlState {
    gate_opened_at: Option<Instant>,
    cancelled: bool,
}

/// StartSignal tells a waiting worker why it was released from the start gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartSignal {
    Go(Instant),
    Halted,
    Cancelled,
}

/// Wake tells a sleeping worker why its tick pause ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Elapsed,
    Halted,
    Cancelled,
}

/// RaceControl bundles the signals every worker blocks on: the one-shot start gate, the halt
/// flag and the cancellation used by a forced shutdown. All of them are one-directional, none
/// is ever reset.
///
/// The halt flag is an atomic so that workers can poll it without touching the mutex; halting
/// still takes the mutex once to wake sleepers.
#[derive(Debug, Default)]
pub struct RaceControl {
    state: Mutex<ControlState>,
    cv: Condvar,
    halted: AtomicBool,
}

impl RaceControl {
    pub fn new() -> RaceControl {
        RaceControl::default()
    }

    fn lock(&self) -> MutexGuard<'_, ControlState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// open_gate releases every worker waiting at the start. Returns false if the gate was
    /// already open, in which case nothing changes.
    pub fn open_gate(&self) -> bool {
        let mut state = self.lock();
        if state.gate_opened_at.is_some() {
            return false;
        }
        state.gate_opened_at = Some(Instant::now());
        self.cv.notify_all();
        true
    }

    pub fn is_open(&self) -> bool {
        self.lock().gate_opened_at.is_some()
    }

    /// The instant the gate opened, i.e. the race start.
    pub fn opened_at(&self) -> Option<Instant> {
        self.lock().gate_opened_at
    }

    pub fn halt(&self) -> bool {
        let first = !self.halted.swap(true, Ordering::AcqRel);
        if first {
            let _state = self.lock();
            self.cv.notify_all();
        }
        first
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    pub fn cancel(&self) -> bool {
        let mut state = self.lock();
        if state.cancelled {
            return false;
        }
        state.cancelled = true;
        self.cv.notify_all();
        true
    }

    /// wait_for_start blocks until the gate opens, the race is halted or the workers are
    /// cancelled. Cancellation wins over the other two.
    pub fn wait_for_start(&self) -> StartSignal {
        let state = self.lock();
        let state = self
            .cv
            .wait_while(state, |st| {
                st.gate_opened_at.is_none() && !st.cancelled && !self.is_halted()
            })
            .unwrap_or_else(PoisonError::into_inner);

        if state.cancelled {
            StartSignal::Cancelled
        } else if let Some(opened_at) = state.gate_opened_at {
            StartSignal::Go(opened_at)
        } else {
            StartSignal::Halted
        }
    }

    /// sleep pauses for `duration` unless the race is halted or cancelled first.
    pub fn sleep(&self, duration: Duration) -> Wake {
        let state = self.lock();
        let (state, _) = self
            .cv
            .wait_timeout_while(state, duration, |st| !st.cancelled && !self.is_halted())
            .unwrap_or_else(PoisonError::into_inner);

        if state.cancelled {
            Wake::Cancelled
        } else if self.is_halted() {
            Wake::Halted
        } else {
            Wake::Elapsed
        }
    }
}
