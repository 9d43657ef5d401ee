#![forbid(unsafe_code)]

//! Burst: a finite run of rapid randomized on/off blinks.
//!
//! Each repetition turns the light on, holds it for a uniform draw from the
//! on-range, turns it off, and holds that for a draw from the off-range.
//! After the last repetition (or immediately, for a count of zero) the light
//! is forced off and [`Step::Done`] is reported exactly once.
//!
//! Expected total time is `count × (mean(on) + mean(off))`.

use crate::chain::Context;
use crate::indicator::IndicatorId;
use crate::rng::{DelayRange, SimRng};

use super::Step;

/// Default on-time per blink.
pub const BURST_ON: DelayRange = DelayRange::new(30.0, 160.0);
/// Default off-time per blink.
pub const BURST_OFF: DelayRange = DelayRange::new(20.0, 110.0);

/// Timing of the two halves of each blink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstShape {
    pub on: DelayRange,
    pub off: DelayRange,
}

impl Default for BurstShape {
    fn default() -> Self {
        Self {
            on: BURST_ON,
            off: BURST_OFF,
        }
    }
}

/// Burst sub-machine.
#[derive(Debug, Clone)]
pub struct Burst {
    remaining: u32,
    lit: bool,
    done: bool,
    shape: BurstShape,
}

impl Burst {
    /// A burst of `count` blinks with the default shape.
    pub fn new(count: u32) -> Self {
        Self::with_shape(count, BurstShape::default())
    }

    pub fn with_shape(count: u32, shape: BurstShape) -> Self {
        Self {
            remaining: count,
            lit: false,
            done: false,
            shape,
        }
    }

    /// Blinks not yet started.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Advance one transition.
    pub fn step(&mut self, id: &IndicatorId, cx: &mut Context<'_>, rng: &mut SimRng) -> Step {
        if self.done {
            return Step::Done;
        }
        if self.lit {
            cx.set_on(id, false);
            self.lit = false;
            self.remaining = self.remaining.saturating_sub(1);
            return Step::Wait(rng.delay(self.shape.off));
        }
        if self.remaining == 0 {
            cx.set_on(id, false);
            self.done = true;
            return Step::Done;
        }
        cx.set_on(id, true);
        self.lit = true;
        Step::Wait(rng.delay(self.shape.on))
    }
}
