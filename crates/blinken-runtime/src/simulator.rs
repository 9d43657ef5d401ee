#![forbid(unsafe_code)]

//! Deterministic simulator for testing.
//!
//! `Simulator` runs chains on a hand-cranked virtual clock against a
//! [`RecordingSurface`], so a whole session can be played in microseconds
//! and asserted on afterwards. With a fixed seed, two simulators given the
//! same registrations produce identical event logs.
//!
//! # Example
//!
//! ```ignore
//! use blinken_runtime::Simulator;
//!
//! let mut sim = Simulator::new(42);
//! let mut rng = sim.rng().fork();
//! engine.start(&mut sim, &mut rng);
//! sim.advance(Duration::from_secs(30));
//! assert!(sim.surface().led("drive8").is_some());
//! ```

use std::collections::HashMap;
use std::time::Duration;

use blinken_core::{Chain, ChainHandle, IndicatorId, SimRng, Spawn, Surface};

use crate::scheduler::Scheduler;

/// One call made on the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Led {
        at: Duration,
        id: IndicatorId,
        on: bool,
    },
    Render {
        at: Duration,
        text: String,
        cursor: bool,
    },
}

impl SurfaceEvent {
    pub fn at(&self) -> Duration {
        match self {
            Self::Led { at, .. } | Self::Render { at, .. } => *at,
        }
    }
}

/// Surface that keeps the current state and a log of every call.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    at: Duration,
    events: Vec<SurfaceEvent>,
    leds: HashMap<IndicatorId, bool>,
    text: String,
    cursor: bool,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far, oldest first.
    pub fn events(&self) -> &[SurfaceEvent] {
        &self.events
    }

    /// Last state written to `id`, or `None` if it was never touched.
    pub fn led(&self, id: &str) -> Option<bool> {
        self.leds.get(&IndicatorId::new(id)).copied()
    }

    /// Every on/off write to `id`, in order, with its time.
    pub fn led_history(&self, id: &str) -> Vec<(Duration, bool)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SurfaceEvent::Led { at, id: led, on } if led.as_str() == id => Some((*at, *on)),
                _ => None,
            })
            .collect()
    }

    /// Text of the last render.
    pub fn screen(&self) -> &str {
        &self.text
    }

    pub fn cursor_visible(&self) -> bool {
        self.cursor
    }

    /// Every rendered text, in order.
    pub fn renders(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|event| match event {
            SurfaceEvent::Render { text, .. } => Some(text.as_str()),
            SurfaceEvent::Led { .. } => None,
        })
    }

    /// Drop the log but keep the current state.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

impl Surface for RecordingSurface {
    fn set_on(&mut self, id: &IndicatorId, on: bool) {
        self.leds.insert(id.clone(), on);
        self.events.push(SurfaceEvent::Led {
            at: self.at,
            id: id.clone(),
            on,
        });
    }

    fn render(&mut self, text: &str, cursor_visible: bool) {
        self.text.clear();
        self.text.push_str(text);
        self.cursor = cursor_visible;
        self.events.push(SurfaceEvent::Render {
            at: self.at,
            text: text.to_string(),
            cursor: cursor_visible,
        });
    }
}

/// Scheduler plus recording surface on a virtual clock.
#[derive(Debug)]
pub struct Simulator {
    scheduler: Scheduler,
    surface: RecordingSurface,
    rng: SimRng,
}

impl Simulator {
    /// A simulator whose [`rng`](Self::rng) is seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            scheduler: Scheduler::new(),
            surface: RecordingSurface::new(),
            rng: SimRng::seed_from_u64(seed),
        }
    }

    /// Master random stream; fork it for each component you start.
    pub fn rng(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn surface(&self) -> &RecordingSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut RecordingSurface {
        &mut self.surface
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Advance the clock by `dt`, running everything that falls due.
    /// Returns the number of resumes.
    pub fn advance(&mut self, dt: Duration) -> usize {
        let deadline = self.scheduler.now() + dt;
        self.run_until(deadline)
    }

    /// Run everything due at or before `t`, then park the clock at `t`.
    pub fn run_until(&mut self, t: Duration) -> usize {
        let mut ran = 0;
        while let Some(due) = self.scheduler.next_due() {
            if due > t {
                break;
            }
            self.surface.at = due.max(self.scheduler.now());
            if self.scheduler.run_next(&mut self.surface).is_some() {
                ran += 1;
            }
        }
        self.scheduler.advance_to(t);
        self.surface.at = self.scheduler.now();
        ran
    }

    /// Resume exactly one chain. Returns `false` when nothing is scheduled.
    pub fn step(&mut self) -> bool {
        let Some(due) = self.scheduler.next_due() else {
            return false;
        };
        self.surface.at = due.max(self.scheduler.now());
        self.scheduler.run_next(&mut self.surface).is_some()
    }
}

impl Spawn for Simulator {
    fn spawn(&mut self, chain: Box<dyn Chain>) -> ChainHandle {
        self.scheduler.spawn(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blinken_core::{Context, Resume};

    struct Blinker {
        id: IndicatorId,
        lit: bool,
    }

    impl Chain for Blinker {
        fn label(&self) -> &str {
            self.id.as_str()
        }

        fn resume(&mut self, cx: &mut Context<'_>) -> Resume {
            self.lit = !self.lit;
            cx.set_on(&self.id, self.lit);
            cx.render(if self.lit { "on" } else { "off" }, self.lit);
            Resume::After(Duration::from_millis(100))
        }
    }

    fn blinker() -> Box<dyn Chain> {
        Box::new(Blinker {
            id: IndicatorId::new("b"),
            lit: false,
        })
    }

    #[test]
    fn events_carry_virtual_time() {
        let mut sim = Simulator::new(0);
        sim.spawn(blinker());
        assert_eq!(sim.advance(Duration::from_millis(250)), 3);
        assert_eq!(
            sim.surface().led_history("b"),
            vec![
                (Duration::ZERO, true),
                (Duration::from_millis(100), false),
                (Duration::from_millis(200), true),
            ]
        );
        assert_eq!(sim.now(), Duration::from_millis(250));
    }

    #[test]
    fn tracks_current_state() {
        let mut sim = Simulator::new(0);
        sim.spawn(blinker());
        sim.advance(Duration::from_millis(150));
        assert_eq!(sim.surface().led("b"), Some(false));
        assert_eq!(sim.surface().led("other"), None);
        assert_eq!(sim.surface().screen(), "off");
        assert!(!sim.surface().cursor_visible());
        assert_eq!(sim.surface().renders().count(), 2);
    }

    #[test]
    fn step_runs_one_resume() {
        let mut sim = Simulator::new(0);
        sim.spawn(blinker());
        assert!(sim.step());
        assert!(sim.step());
        assert_eq!(sim.now(), Duration::from_millis(100));
        assert_eq!(sim.surface().events().len(), 4);
    }

    #[test]
    fn cancelled_chain_stops_recording() {
        let mut sim = Simulator::new(0);
        let handle = sim.spawn(blinker());
        sim.advance(Duration::from_millis(50));
        handle.cancel();
        sim.surface_mut().clear_events();
        sim.advance(Duration::from_secs(1));
        assert!(sim.surface().events().is_empty());
        assert!(!sim.step());
    }
}
