use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Signal is a one-shot flag many threads can block on. It starts unset, can be fired exactly
/// once and is never reset afterwards.
#[derive(Debug, Default)]
pub struct Signal {
    fired: Mutex<bool>,
    cv: Condvar,
}

impl Signal {
    pub fn new() -> Signal {
        Signal::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.fired.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// fire sets the signal and wakes all waiters. Returns true only for the call that actually
    /// fired it.
    pub fn fire(&self) -> bool {
        let mut fired = self.lock();
        if *fired {
            return false;
        }
        *fired = true;
        self.cv.notify_all();
        true
    }

    pub fn is_fired(&self) -> bool {
        *self.lock()
    }

    /// wait_timeout blocks at most `timeout` and returns whether the signal is fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (guard, _) = self
            .cv
            .wait_timeout_while(guard, timeout, |fired| !*fired)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}
