//! Property-based invariant tests for the blink primitives and the script
//! buffer.
//!
//! 1. A burst of any count completes exactly once, with the light off.
//! 2. A burst never issues more on-transitions than its count.
//! 3. A steady blink runs at least `total` and overshoots by one interval at most.
//! 4. The script buffer never holds more than `max_lines` lines.
//! 5. An indicator with an unknown profile is never driven.

use std::time::Duration;

use blinken_core::blink::{Burst, Step, SteadyBlink, chain_for};
use blinken_core::{
    Context, EngineConfig, Indicator, IndicatorId, Profile, ScriptBuffer, SimRng, Surface,
};
use proptest::prelude::*;

#[derive(Default)]
struct Trace {
    leds: Vec<(IndicatorId, bool)>,
}

impl Surface for Trace {
    fn set_on(&mut self, id: &IndicatorId, on: bool) {
        self.leds.push((id.clone(), on));
    }

    fn render(&mut self, _text: &str, _cursor_visible: bool) {}
}

/// Drive `step` until it reports `Done`, capped at `limit` steps.
/// Returns (elapsed, steps taken).
fn run(
    trace: &mut Trace,
    limit: usize,
    mut step: impl FnMut(&mut Context<'_>) -> Step,
) -> (Duration, usize) {
    let mut now = Duration::ZERO;
    for n in 1..=limit {
        let mut cx = Context::new(now, trace);
        match step(&mut cx) {
            Step::Wait(d) => now += d,
            Step::Done => return (now, n),
        }
    }
    panic!("sub-machine did not finish within {limit} steps");
}

// ── Strategies ────────────────────────────────────────────────────────────

fn lines_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z ]{0,12}(\n){0,3}", 0..40)
}

proptest! {
    #[test]
    fn burst_finishes_once_and_dark(count in 0u32..64, seed in any::<u64>()) {
        let id = IndicatorId::new("drive8");
        let mut trace = Trace::default();
        let mut rng = SimRng::seed_from_u64(seed);
        let mut burst = Burst::new(count);
        let (_, steps) = run(&mut trace, 10_000, |cx| burst.step(&id, cx, &mut rng));

        prop_assert_eq!(steps as u32, 2 * count + 1);
        prop_assert_eq!(trace.leds.last().map(|(_, on)| *on), Some(false));
        let ons = trace.leds.iter().filter(|(_, on)| *on).count() as u32;
        prop_assert_eq!(ons, count);

        // Sticky: further steps report Done without touching the light.
        let before = trace.leds.len();
        let mut cx = Context::new(Duration::ZERO, &mut trace);
        prop_assert_eq!(burst.step(&id, &mut cx, &mut rng), Step::Done);
        prop_assert_eq!(trace.leds.len(), before);
    }

    #[test]
    fn steady_blink_overshoot_is_bounded(
        on_ms in 40u32..200,
        off_ms in 40u32..200,
        total_ms in 0u64..4000,
        seed in any::<u64>(),
    ) {
        let id = IndicatorId::new("tape");
        let mut trace = Trace::default();
        let mut rng = SimRng::seed_from_u64(seed);
        let total = Duration::from_millis(total_ms);
        let mut blink = SteadyBlink::new(f64::from(on_ms), f64::from(off_ms), total);
        let (elapsed, _) = run(&mut trace, 100_000, |cx| blink.step(&id, cx, &mut rng));

        let slack = Duration::from_millis(u64::from(on_ms.max(off_ms)) + 10);
        prop_assert!(elapsed >= total);
        prop_assert!(elapsed <= total + slack, "{:?} > {:?} + {:?}", elapsed, total, slack);
        prop_assert_eq!(trace.leds.last().map(|(_, on)| *on), Some(false));
    }

    #[test]
    fn script_buffer_respects_max_lines(max_lines in 0usize..20, chunks in lines_strategy()) {
        let mut buffer = ScriptBuffer::new(max_lines);
        for chunk in &chunks {
            buffer.push(chunk);
            prop_assert!(buffer.line_count() <= max_lines.max(1));
        }
    }

    #[test]
    fn unknown_profiles_are_never_driven(tag in "[a-z]{1,10}") {
        let profile = Profile::parse(&tag);
        let led = Indicator::new("x", profile.clone());
        let chain = chain_for(&led, SimRng::seed_from_u64(0), EngineConfig::default());
        prop_assert_eq!(chain.is_none(), !profile.is_driven());
    }
}

#[test]
fn buffer_keeps_the_tail_of_the_text() {
    let mut buffer = ScriptBuffer::new(2);
    for ch in "l1\nl2\nl3\nl4".chars() {
        buffer.push(&ch.to_string());
    }
    assert_eq!(buffer.content(), "l3\nl4");
}
