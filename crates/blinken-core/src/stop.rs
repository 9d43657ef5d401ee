#![forbid(unsafe_code)]

//! Stop signals for chains and drivers.
//!
//! A [`StopSignal`] is the observing half, checked by whoever runs a chain
//! (the scheduler before every resume, the real-time driver while it sleeps).
//! A [`StopTrigger`] is the owning half handed to whoever may end the run:
//! a [`ChainHandle`](crate::chain::ChainHandle), a signal handler thread, or
//! a test.
//!
//! Once triggered a signal never resets.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

type Shared = Arc<(Mutex<bool>, Condvar)>;

/// Observing half of a stop pair.
#[derive(Debug, Clone)]
pub struct StopSignal {
    inner: Shared,
}

impl StopSignal {
    /// Create a new stop signal pair (signal, trigger).
    pub fn new() -> (Self, StopTrigger) {
        let inner: Shared = Arc::new((Mutex::new(false), Condvar::new()));
        let signal = Self {
            inner: inner.clone(),
        };
        let trigger = StopTrigger { inner };
        (signal, trigger)
    }

    /// Check if the stop signal has been triggered.
    pub fn is_stopped(&self) -> bool {
        *lock(&self.inner.0)
    }

    /// Wait for either the stop signal or a timeout.
    ///
    /// Returns `true` if stopped, `false` if timed out.
    /// Handles spurious wakeups by looping until condition met or timeout expired.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock_ref, cvar) = &*self.inner;
        let mut stopped = lock(lock_ref);
        if *stopped {
            return true;
        }

        let start = Instant::now();
        let mut remaining = duration;

        loop {
            let (guard, result) = cvar
                .wait_timeout(stopped, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            stopped = guard;
            if *stopped {
                return true;
            }
            if result.timed_out() {
                return false;
            }
            let elapsed = start.elapsed();
            if elapsed >= duration {
                return false;
            }
            remaining = duration - elapsed;
        }
    }
}

/// Owning half of a stop pair.
#[derive(Debug, Clone)]
pub struct StopTrigger {
    inner: Shared,
}

impl StopTrigger {
    /// Trip the signal and wake every waiter.
    pub fn stop(&self) {
        let (lock_ref, cvar) = &*self.inner;
        let mut stopped = lock(lock_ref);
        *stopped = true;
        cvar.notify_all();
    }

    /// Whether [`stop`](Self::stop) has been called on any clone.
    pub fn is_stopped(&self) -> bool {
        *lock(&self.inner.0)
    }
}

// A poisoned flag is still a valid bool.
fn lock(mutex: &Mutex<bool>) -> MutexGuard<'_, bool> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
