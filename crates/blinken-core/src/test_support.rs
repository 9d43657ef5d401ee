//! Hand-cranked surfaces and drivers for unit tests.

use std::time::Duration;

use crate::blink::Step;
use crate::chain::{Chain, Context, Resume, Surface};
use crate::indicator::IndicatorId;

/// Records every surface call with the time it happened at.
#[derive(Debug, Default)]
pub(crate) struct LogSurface {
    pub now: Duration,
    pub leds: Vec<(Duration, IndicatorId, bool)>,
    pub renders: Vec<(Duration, String, bool)>,
}

impl LogSurface {
    pub fn led_changes(&self, id: &IndicatorId) -> Vec<bool> {
        self.leds
            .iter()
            .filter(|(_, led, _)| led == id)
            .map(|(_, _, on)| *on)
            .collect()
    }

    pub fn last_render(&self) -> Option<&str> {
        self.renders.last().map(|(_, text, _)| text.as_str())
    }
}

impl Surface for LogSurface {
    fn set_on(&mut self, id: &IndicatorId, on: bool) {
        self.leds.push((self.now, id.clone(), on));
    }

    fn render(&mut self, text: &str, cursor_visible: bool) {
        self.renders.push((self.now, text.to_string(), cursor_visible));
    }
}

/// Run a sub-machine to completion; returns (elapsed, number of `Done`s seen).
pub(crate) fn drive_step(
    surface: &mut LogSurface,
    mut step: impl FnMut(&mut Context<'_>) -> Step,
) -> (Duration, usize) {
    let start = surface.now;
    loop {
        let now = surface.now;
        let mut cx = Context::new(now, surface);
        match step(&mut cx) {
            Step::Wait(d) => surface.now = now + d,
            Step::Done => return (surface.now - start, 1),
        }
    }
}

/// Resume a chain until the clock passes `until`; returns the number of resumes.
pub(crate) fn drive_chain(chain: &mut dyn Chain, surface: &mut LogSurface, until: Duration) -> usize {
    let mut resumes = 0;
    while surface.now <= until {
        let now = surface.now;
        let mut cx = Context::new(now, surface);
        resumes += 1;
        match chain.resume(&mut cx) {
            Resume::After(d) => surface.now = now + d,
            Resume::Finished => break,
        }
    }
    resumes
}
