#![forbid(unsafe_code)]

//! Single timer queue driving every chain.
//!
//! The scheduler owns a virtual clock (time since its epoch) and a min-heap
//! of pending wakeups, at most one per live chain. It never sleeps: callers
//! decide how the clock advances, either against the wall clock
//! ([`Driver`](crate::Driver)) or by hand ([`Simulator`](crate::Simulator)).
//!
//! # Invariants
//!
//! 1. Wakeups run in order of due time; ties run in the order they were
//!    scheduled (FIFO by sequence number).
//! 2. The clock never goes backwards.
//! 3. A chain whose handle was cancelled is dropped before its next resume
//!    and never touches the surface again.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::time::Duration;

use blinken_core::{Chain, ChainHandle, ChainId, Context, Resume, Spawn, StopSignal, Surface};

#[derive(Debug)]
struct Wakeup {
    due: Duration,
    seq: u64,
    chain: ChainId,
}

impl PartialEq for Wakeup {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Wakeup {}

impl PartialOrd for Wakeup {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Wakeup {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the earliest first.
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct Slot {
    chain: Box<dyn Chain>,
    stop: StopSignal,
}

/// Cooperative scheduler over a virtual clock.
#[derive(Default)]
pub struct Scheduler {
    now: Duration,
    queue: BinaryHeap<Wakeup>,
    slots: Vec<Option<Slot>>,
    seq: u64,
    resumes: u64,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now)
            .field("pending", &self.queue.len())
            .field("active", &self.active_chains())
            .field("resumes", &self.resumes)
            .finish()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Total resumes performed so far.
    pub fn resumes(&self) -> u64 {
        self.resumes
    }

    /// Chains that have not finished or been dropped.
    pub fn active_chains(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Due time of the earliest live wakeup.
    ///
    /// Cancelled chains at the head of the queue are dropped first, so a
    /// caller sleeping until this instant never wakes up for nothing.
    pub fn next_due(&mut self) -> Option<Duration> {
        self.purge_cancelled();
        self.queue.peek().map(|w| w.due)
    }

    /// Nothing left to run, now or later.
    pub fn is_idle(&mut self) -> bool {
        self.next_due().is_none()
    }

    /// Move the clock forward without running anything. Earlier times are
    /// ignored.
    pub fn advance_to(&mut self, t: Duration) {
        self.now = self.now.max(t);
    }

    /// Pop the earliest wakeup and resume its chain.
    ///
    /// The clock jumps to the wakeup's due time (or stays put if it is
    /// already past it). Returns the chain that ran, or `None` when the
    /// queue is empty.
    pub fn run_next(&mut self, surface: &mut dyn Surface) -> Option<ChainId> {
        self.purge_cancelled();
        let wakeup = self.queue.pop()?;
        self.advance_to(wakeup.due);

        let Some(slot) = self.slots.get_mut(wakeup.chain.0).and_then(Option::as_mut) else {
            return None;
        };
        let mut cx = Context::new(self.now, surface);
        let resume = slot.chain.resume(&mut cx);
        self.resumes += 1;

        match resume {
            Resume::After(delay) => {
                let due = self.now + delay;
                tracing::trace!(chain = %wakeup.chain, ?delay, "chain suspended");
                self.push(wakeup.chain, due);
            }
            Resume::Finished => {
                tracing::debug!(chain = %wakeup.chain, "chain finished");
                self.slots[wakeup.chain.0] = None;
            }
        }
        Some(wakeup.chain)
    }

    /// Run every wakeup due at or before `deadline`, then set the clock to
    /// `deadline`. Returns the number of resumes.
    pub fn run_until(&mut self, deadline: Duration, surface: &mut dyn Surface) -> usize {
        let mut ran = 0;
        while self.next_due().is_some_and(|due| due <= deadline) {
            if self.run_next(surface).is_some() {
                ran += 1;
            }
        }
        self.advance_to(deadline);
        ran
    }

    fn push(&mut self, chain: ChainId, due: Duration) {
        let seq = self.seq;
        self.seq += 1;
        self.queue.push(Wakeup { due, seq, chain });
    }

    fn purge_cancelled(&mut self) {
        while let Some(head) = self.queue.peek() {
            let id = head.chain;
            let live = match self.slots.get(id.0).and_then(Option::as_ref) {
                Some(slot) => !slot.stop.is_stopped(),
                None => false,
            };
            if live {
                return;
            }
            self.queue.pop();
            if let Some(slot) = self.slots.get_mut(id.0).and_then(Option::take) {
                tracing::debug!(chain = %id, label = slot.chain.label(), "chain cancelled");
            }
        }
    }
}

impl Spawn for Scheduler {
    fn spawn(&mut self, chain: Box<dyn Chain>) -> ChainHandle {
        let id = ChainId(self.slots.len());
        let (stop, trigger) = StopSignal::new();
        tracing::debug!(chain = %id, label = chain.label(), "chain spawned");
        self.slots.push(Some(Slot { chain, stop }));
        self.push(id, self.now);
        ChainHandle::new(id, trigger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blinken_core::IndicatorId;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Null;

    impl Surface for Null {
        fn set_on(&mut self, _id: &IndicatorId, _on: bool) {}
        fn render(&mut self, _text: &str, _cursor_visible: bool) {}
    }

    /// Logs `(label, now)` on every resume and finishes after `steps`.
    struct Ticker {
        label: &'static str,
        period: Duration,
        steps: u32,
        log: Rc<RefCell<Vec<(&'static str, Duration)>>>,
    }

    impl Chain for Ticker {
        fn label(&self) -> &str {
            self.label
        }

        fn resume(&mut self, cx: &mut Context<'_>) -> Resume {
            self.log.borrow_mut().push((self.label, cx.now()));
            if self.steps == 0 {
                return Resume::Finished;
            }
            self.steps -= 1;
            Resume::After(self.period)
        }
    }

    fn ticker(
        label: &'static str,
        period_ms: u64,
        steps: u32,
        log: &Rc<RefCell<Vec<(&'static str, Duration)>>>,
    ) -> Box<dyn Chain> {
        Box::new(Ticker {
            label,
            period: Duration::from_millis(period_ms),
            steps,
            log: Rc::clone(log),
        })
    }

    #[test]
    fn earliest_first_and_fifo_on_ties() {
        let log = Rc::default();
        let mut sched = Scheduler::new();
        sched.spawn(ticker("a", 30, 2, &log));
        sched.spawn(ticker("b", 20, 2, &log));
        sched.spawn(ticker("c", 30, 2, &log));
        sched.run_until(Duration::from_secs(1), &mut Null);

        let ms = |n| Duration::from_millis(n);
        assert_eq!(
            *log.borrow(),
            vec![
                ("a", ms(0)),
                ("b", ms(0)),
                ("c", ms(0)),
                ("b", ms(20)),
                ("a", ms(30)),
                ("c", ms(30)),
                ("b", ms(40)),
                ("a", ms(60)),
                ("c", ms(60)),
            ]
        );
        assert_eq!(sched.active_chains(), 0);
        assert!(sched.is_idle());
    }

    #[test]
    fn run_until_stops_at_deadline() {
        let log = Rc::default();
        let mut sched = Scheduler::new();
        sched.spawn(ticker("a", 100, 10, &log));
        assert_eq!(sched.run_until(Duration::from_millis(250), &mut Null), 3);
        assert_eq!(sched.now(), Duration::from_millis(250));
        assert_eq!(sched.next_due(), Some(Duration::from_millis(300)));
    }

    #[test]
    fn cancelled_chain_is_dropped_before_next_resume() {
        let log = Rc::default();
        let mut sched = Scheduler::new();
        let a = sched.spawn(ticker("a", 10, 100, &log));
        sched.spawn(ticker("b", 25, 100, &log));
        sched.run_until(Duration::from_millis(20), &mut Null);
        a.cancel();
        assert!(a.is_cancelled());
        sched.run_until(Duration::from_millis(100), &mut Null);

        let late_a = log
            .borrow()
            .iter()
            .filter(|(label, at)| *label == "a" && *at > Duration::from_millis(20))
            .count();
        assert_eq!(late_a, 0);
        assert_eq!(sched.active_chains(), 1);
    }

    #[test]
    fn spawn_mid_run_starts_at_current_time() {
        let log = Rc::default();
        let mut sched = Scheduler::new();
        sched.advance_to(Duration::from_millis(500));
        sched.spawn(ticker("late", 10, 0, &log));
        sched.run_until(Duration::from_millis(500), &mut Null);
        assert_eq!(*log.borrow(), vec![("late", Duration::from_millis(500))]);
    }

    #[test]
    fn clock_is_monotonic() {
        let mut sched = Scheduler::new();
        sched.advance_to(Duration::from_millis(50));
        sched.advance_to(Duration::from_millis(10));
        assert_eq!(sched.now(), Duration::from_millis(50));
    }

    #[test]
    fn empty_scheduler_is_idle() {
        let mut sched = Scheduler::new();
        assert!(sched.is_idle());
        assert_eq!(sched.run_next(&mut Null), None);
        assert_eq!(sched.resumes(), 0);
    }
}
