#![forbid(unsafe_code)]

//! Steady blink: metronomic on/off bounded by elapsed time.
//!
//! Unlike [`Burst`](super::Burst), the run length is a duration, not a
//! count. The elapsed time since the first step is checked before every
//! on-phase and again right after every on-phase, so the pattern overshoots
//! `total` by at most one jittered interval: `max(on, off) + JITTER_MS`.

use std::time::Duration;

use crate::chain::Context;
use crate::indicator::IndicatorId;
use crate::rng::{DelayRange, SimRng};

use super::Step;

/// Each interval is jittered uniformly by this much in both directions.
pub const JITTER_MS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Dark,
    Lit,
}

/// Steady-blink sub-machine.
#[derive(Debug, Clone)]
pub struct SteadyBlink {
    on: DelayRange,
    off: DelayRange,
    total: Duration,
    started: Option<Duration>,
    phase: Phase,
    done: bool,
}

impl SteadyBlink {
    pub fn new(on_ms: f64, off_ms: f64, total: Duration) -> Self {
        Self {
            on: DelayRange::around(on_ms, JITTER_MS),
            off: DelayRange::around(off_ms, JITTER_MS),
            total,
            started: None,
            phase: Phase::Dark,
            done: false,
        }
    }

    /// Requested run length.
    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Advance one transition. The first call starts the clock.
    pub fn step(&mut self, id: &IndicatorId, cx: &mut Context<'_>, rng: &mut SimRng) -> Step {
        if self.done {
            return Step::Done;
        }
        let start = *self.started.get_or_insert(cx.now());
        let expired = cx.now().saturating_sub(start) >= self.total;

        match self.phase {
            Phase::Lit => {
                cx.set_on(id, false);
                if expired {
                    self.done = true;
                    return Step::Done;
                }
                self.phase = Phase::Dark;
                Step::Wait(rng.delay(self.off))
            }
            Phase::Dark => {
                if expired {
                    cx.set_on(id, false);
                    self.done = true;
                    return Step::Done;
                }
                cx.set_on(id, true);
                self.phase = Phase::Lit;
                Step::Wait(rng.delay(self.on))
            }
        }
    }
}
