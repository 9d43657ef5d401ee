#![forbid(unsafe_code)]

//! Per-profile state machines.
//!
//! | Profile | Cycle |
//! |---------|-------|
//! | power | on for 8–20 s, off for 40–120 ms |
//! | activity | idle 1.5–5.5 s, burst of 4–21, then 60% of the time a 0.2–0.6 s gap and a burst of 3–12 |
//! | tape | 1.5–3 s pilot tone, 0.2–0.5 s gap, burst of 12–31, 0.3–0.8 s gap, then 70% of the time a burst of 8–22 and a 2–5 s pause, else a 1.5–3.5 s pause |
//!
//! Every chain here is infinite: `resume` never returns
//! [`Resume::Finished`].

use std::time::Duration;

use crate::chain::{Chain, Context, Resume};
use crate::indicator::IndicatorId;
use crate::rng::{DelayRange, SimRng};

use super::{Burst, Step, SteadyBlink};

/// Time spent lit between flickers.
pub const POWER_DWELL: DelayRange = DelayRange::new(8_000.0, 20_000.0);
/// Length of one flicker.
pub const POWER_FLICKER: DelayRange = DelayRange::new(40.0, 120.0);

/// Desynchronizing offset before the first activity cycle.
pub const ACTIVITY_OFFSET: DelayRange = DelayRange::new(0.0, 3_000.0);
pub const ACTIVITY_IDLE: DelayRange = DelayRange::new(1_500.0, 5_500.0);
pub const ACTIVITY_GAP: DelayRange = DelayRange::new(200.0, 600.0);
pub const ACTIVITY_FIRST_COUNT: (u32, u32) = (4, 21);
pub const ACTIVITY_SECOND_COUNT: (u32, u32) = (3, 12);
/// Probability of a second, shorter burst.
pub const ACTIVITY_DOUBLE_CHANCE: f64 = 0.6;

pub const TAPE_TONE_MS: f64 = 120.0;
pub const TAPE_HEADER: DelayRange = DelayRange::new(1_500.0, 3_000.0);
pub const TAPE_SYNC_GAP: DelayRange = DelayRange::new(200.0, 500.0);
pub const TAPE_BLOCK_GAP: DelayRange = DelayRange::new(300.0, 800.0);
pub const TAPE_FIRST_COUNT: (u32, u32) = (12, 31);
pub const TAPE_SECOND_COUNT: (u32, u32) = (8, 22);
/// Probability that the second data block is present.
pub const TAPE_SECOND_CHANCE: f64 = 0.7;
pub const TAPE_PAUSE_LONG: DelayRange = DelayRange::new(2_000.0, 5_000.0);
pub const TAPE_PAUSE_SHORT: DelayRange = DelayRange::new(1_500.0, 3_500.0);

fn draw_count(rng: &mut SimRng, (lo, hi): (u32, u32)) -> u32 {
    rng.count(lo..=hi)
}

// ---------------------------------------------------------------------------
// Power
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PowerState {
    /// Light is off (initially, or mid-flicker); next resume turns it on.
    Flickering,
    /// Light is on; next resume starts a flicker.
    On,
}

/// Always on, with a rare brief flicker.
#[derive(Debug)]
pub struct PowerChain {
    id: IndicatorId,
    rng: SimRng,
    state: PowerState,
}

impl PowerChain {
    pub fn new(id: IndicatorId, rng: SimRng) -> Self {
        Self {
            id,
            rng,
            state: PowerState::Flickering,
        }
    }
}

impl Chain for PowerChain {
    fn label(&self) -> &str {
        self.id.as_str()
    }

    fn resume(&mut self, cx: &mut Context<'_>) -> Resume {
        match self.state {
            PowerState::Flickering => {
                cx.set_on(&self.id, true);
                self.state = PowerState::On;
                Resume::After(self.rng.delay(POWER_DWELL))
            }
            PowerState::On => {
                cx.set_on(&self.id, false);
                self.state = PowerState::Flickering;
                crate::trace!(led = %self.id, "power flicker");
                Resume::After(self.rng.delay(POWER_FLICKER))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum ActivityState {
    /// Before the first cycle.
    Offset,
    /// Start of a cycle: go idle.
    Idle,
    First(Burst),
    /// Between the two bursts of a double access.
    Gap,
    Second(Burst),
}

/// Disk drive access light.
#[derive(Debug)]
pub struct ActivityChain {
    id: IndicatorId,
    rng: SimRng,
    stagger: bool,
    state: ActivityState,
}

impl ActivityChain {
    /// `stagger` enables the random initial offset.
    pub fn new(id: IndicatorId, rng: SimRng, stagger: bool) -> Self {
        Self {
            id,
            rng,
            stagger,
            state: ActivityState::Offset,
        }
    }
}

impl Chain for ActivityChain {
    fn label(&self) -> &str {
        self.id.as_str()
    }

    fn resume(&mut self, cx: &mut Context<'_>) -> Resume {
        loop {
            match &mut self.state {
                ActivityState::Offset => {
                    self.state = ActivityState::Idle;
                    if self.stagger {
                        return Resume::After(self.rng.delay(ACTIVITY_OFFSET));
                    }
                }
                ActivityState::Idle => {
                    let idle = self.rng.delay(ACTIVITY_IDLE);
                    let count = draw_count(&mut self.rng, ACTIVITY_FIRST_COUNT);
                    self.state = ActivityState::First(Burst::new(count));
                    return Resume::After(idle);
                }
                ActivityState::First(burst) => match burst.step(&self.id, cx, &mut self.rng) {
                    Step::Wait(d) => return Resume::After(d),
                    Step::Done => {
                        self.state = if self.rng.chance(ACTIVITY_DOUBLE_CHANCE) {
                            ActivityState::Gap
                        } else {
                            ActivityState::Idle
                        };
                    }
                },
                ActivityState::Gap => {
                    let gap = self.rng.delay(ACTIVITY_GAP);
                    let count = draw_count(&mut self.rng, ACTIVITY_SECOND_COUNT);
                    self.state = ActivityState::Second(Burst::new(count));
                    return Resume::After(gap);
                }
                ActivityState::Second(burst) => match burst.step(&self.id, cx, &mut self.rng) {
                    Step::Wait(d) => return Resume::After(d),
                    Step::Done => self.state = ActivityState::Idle,
                },
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tape
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum TapeState {
    /// Start of a cycle: begin the pilot tone.
    Rewind,
    Header(SteadyBlink),
    First(Burst),
    /// After the first data block: second block or skip.
    Decide,
    Second(Burst),
}

/// Cassette loading light.
#[derive(Debug)]
pub struct TapeChain {
    id: IndicatorId,
    rng: SimRng,
    state: TapeState,
}

impl TapeChain {
    pub fn new(id: IndicatorId, rng: SimRng) -> Self {
        Self {
            id,
            rng,
            state: TapeState::Rewind,
        }
    }
}

impl Chain for TapeChain {
    fn label(&self) -> &str {
        self.id.as_str()
    }

    fn resume(&mut self, cx: &mut Context<'_>) -> Resume {
        loop {
            match &mut self.state {
                TapeState::Rewind => {
                    let header: Duration = self.rng.delay(TAPE_HEADER);
                    self.state =
                        TapeState::Header(SteadyBlink::new(TAPE_TONE_MS, TAPE_TONE_MS, header));
                }
                TapeState::Header(tone) => match tone.step(&self.id, cx, &mut self.rng) {
                    Step::Wait(d) => return Resume::After(d),
                    Step::Done => {
                        let gap = self.rng.delay(TAPE_SYNC_GAP);
                        let count = draw_count(&mut self.rng, TAPE_FIRST_COUNT);
                        self.state = TapeState::First(Burst::new(count));
                        return Resume::After(gap);
                    }
                },
                TapeState::First(burst) => match burst.step(&self.id, cx, &mut self.rng) {
                    Step::Wait(d) => return Resume::After(d),
                    Step::Done => {
                        self.state = TapeState::Decide;
                        return Resume::After(self.rng.delay(TAPE_BLOCK_GAP));
                    }
                },
                TapeState::Decide => {
                    if self.rng.chance(TAPE_SECOND_CHANCE) {
                        let count = draw_count(&mut self.rng, TAPE_SECOND_COUNT);
                        self.state = TapeState::Second(Burst::new(count));
                    } else {
                        self.state = TapeState::Rewind;
                        return Resume::After(self.rng.delay(TAPE_PAUSE_SHORT));
                    }
                }
                TapeState::Second(burst) => match burst.step(&self.id, cx, &mut self.rng) {
                    Step::Wait(d) => return Resume::After(d),
                    Step::Done => {
                        self.state = TapeState::Rewind;
                        return Resume::After(self.rng.delay(TAPE_PAUSE_LONG));
                    }
                },
            }
        }
    }
}
