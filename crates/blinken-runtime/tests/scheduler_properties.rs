//! Scheduler ordering properties and lifecycle logging.
//!
//! 1. Resumes are observed in non-decreasing time order.
//! 2. Each chain is resumed exactly at its requested times.
//! 3. Spawn, cancel and finish each emit one debug event.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use blinken_core::{Chain, Context, IndicatorId, Resume, Spawn, Surface};
use blinken_runtime::Scheduler;
use proptest::prelude::*;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
use tracing_subscriber::Layer;

struct Null;

impl Surface for Null {
    fn set_on(&mut self, _id: &IndicatorId, _on: bool) {}
    fn render(&mut self, _text: &str, _cursor_visible: bool) {}
}

type Log = Rc<RefCell<Vec<(usize, Duration)>>>;

/// Resumes after each delay in `delays`, then finishes.
struct Scripted {
    index: usize,
    delays: Vec<u64>,
    next: usize,
    log: Log,
}

impl Chain for Scripted {
    fn label(&self) -> &str {
        "scripted"
    }

    fn resume(&mut self, cx: &mut Context<'_>) -> Resume {
        self.log.borrow_mut().push((self.index, cx.now()));
        match self.delays.get(self.next) {
            Some(ms) => {
                self.next += 1;
                Resume::After(Duration::from_millis(*ms))
            }
            None => Resume::Finished,
        }
    }
}

// ── Strategies ────────────────────────────────────────────────────────────

fn chains_strategy() -> impl Strategy<Value = Vec<Vec<u64>>> {
    prop::collection::vec(prop::collection::vec(0u64..500, 0..20), 1..8)
}

proptest! {
    #[test]
    fn resumes_are_time_ordered_and_on_schedule(chains in chains_strategy()) {
        let log: Log = Rc::default();
        let mut sched = Scheduler::new();
        for (index, delays) in chains.iter().enumerate() {
            sched.spawn(Box::new(Scripted {
                index,
                delays: delays.clone(),
                next: 0,
                log: Rc::clone(&log),
            }));
        }
        sched.run_until(Duration::from_secs(3600), &mut Null);
        prop_assert!(sched.is_idle());

        let log = log.borrow();
        prop_assert!(log.windows(2).all(|w| w[0].1 <= w[1].1));

        for (index, delays) in chains.iter().enumerate() {
            let seen: Vec<Duration> = log
                .iter()
                .filter(|(i, _)| *i == index)
                .map(|(_, at)| *at)
                .collect();
            let mut expected = vec![Duration::ZERO];
            let mut t = Duration::ZERO;
            for ms in delays {
                t += Duration::from_millis(*ms);
                expected.push(t);
            }
            prop_assert_eq!(seen, expected);
        }
    }
}

// ---------------------------------------------------------------------------
// Tracing helpers
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct MessageLog {
    messages: Arc<Mutex<Vec<String>>>,
}

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        }
    }
}

impl<S> Layer<S> for MessageLog
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: LayerContext<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        if let Some(message) = visitor.message {
            self.messages.lock().unwrap().push(message);
        }
    }
}

#[test]
fn lifecycle_events_are_logged() {
    let log = MessageLog::default();
    let messages = log.messages.clone();
    let subscriber = tracing_subscriber::registry().with(log);
    let _guard = tracing::subscriber::set_default(subscriber);
    tracing::callsite::rebuild_interest_cache();

    let chain_log: Log = Rc::default();
    let mut sched = Scheduler::new();
    let scripted = |index, delays: Vec<u64>| {
        Box::new(Scripted {
            index,
            delays,
            next: 0,
            log: Rc::clone(&chain_log),
        })
    };
    sched.spawn(scripted(0, vec![10]));
    let doomed = sched.spawn(scripted(1, vec![10, 10, 10]));
    sched.run_until(Duration::from_millis(5), &mut Null);
    doomed.cancel();
    sched.run_until(Duration::from_millis(100), &mut Null);

    let messages = messages.lock().unwrap();
    let count = |text: &str| messages.iter().filter(|m| m.as_str() == text).count();
    assert_eq!(count("chain spawned"), 2);
    assert_eq!(count("chain finished"), 1);
    assert_eq!(count("chain cancelled"), 1);
}
