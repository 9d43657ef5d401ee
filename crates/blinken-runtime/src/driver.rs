#![forbid(unsafe_code)]

//! Wall-clock driver for the [`Scheduler`].
//!
//! The driver maps the scheduler's virtual clock onto real elapsed time
//! since [`Driver::run`] started. Between wakeups it sleeps on a
//! process-wide [`StopSignal`], so a signal handler or another thread can
//! end the run without waiting for the next wakeup.
//!
//! # Failure Modes
//!
//! - If `present` fails, the run ends and the error is returned. Chains are
//!   left in place; nothing is rolled back.
//! - If the process stalls (suspended, heavily loaded), overdue wakeups run
//!   back to back on the next pass until the scheduler catches up.

use std::io;
use std::time::{Duration, Instant};

use blinken_core::{Chain, ChainHandle, Spawn, StopSignal, StopTrigger, Surface};

use crate::scheduler::Scheduler;

/// Longest single sleep, even with nothing scheduled.
pub const IDLE_PARK: Duration = Duration::from_secs(1);

/// Driver knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// End the run after this much wall-clock time.
    pub exit_after: Option<Duration>,
    /// Upper bound on one sleep between passes.
    pub park: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            exit_after: None,
            park: IDLE_PARK,
        }
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The stop trigger fired.
    Signalled,
    /// `exit_after` elapsed.
    Deadline,
    /// Every chain finished or was cancelled.
    Idle,
}

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub resumes: u64,
    pub elapsed: Duration,
    pub reason: StopReason,
}

/// Runs a scheduler against the wall clock.
#[derive(Debug)]
pub struct Driver {
    scheduler: Scheduler,
    config: DriverConfig,
    stop: StopSignal,
    trigger: StopTrigger,
}

impl Driver {
    pub fn new(config: DriverConfig) -> Self {
        let (stop, trigger) = StopSignal::new();
        Self {
            scheduler: Scheduler::new(),
            config,
            stop,
            trigger,
        }
    }

    /// Trigger that ends [`run`](Self::run) from anywhere.
    pub fn stop_trigger(&self) -> StopTrigger {
        self.trigger.clone()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Run until stopped, past the deadline, or idle.
    ///
    /// `present` is called after every pass that resumed at least one chain,
    /// so a surface can batch all changes due at the same instant into one
    /// flush.
    ///
    /// # Errors
    ///
    /// Returns the first error from `present`.
    pub fn run<S, P>(&mut self, surface: &mut S, mut present: P) -> io::Result<RunSummary>
    where
        S: Surface,
        P: FnMut(&mut S) -> io::Result<()>,
    {
        let epoch = Instant::now();
        let base = self.scheduler.now();
        let start_resumes = self.scheduler.resumes();
        tracing::info!(
            chains = self.scheduler.active_chains(),
            exit_after = ?self.config.exit_after,
            "driver started"
        );

        let reason = loop {
            if self.stop.is_stopped() {
                break StopReason::Signalled;
            }
            let elapsed = epoch.elapsed();
            if self.config.exit_after.is_some_and(|limit| elapsed >= limit) {
                break StopReason::Deadline;
            }

            let ran = self.scheduler.run_until(base + elapsed, surface);
            if ran > 0 {
                present(surface)?;
            }

            let Some(due) = self.scheduler.next_due() else {
                break StopReason::Idle;
            };
            let mut sleep = due
                .saturating_sub(base + epoch.elapsed())
                .min(self.config.park);
            if let Some(limit) = self.config.exit_after {
                sleep = sleep.min(limit.saturating_sub(epoch.elapsed()));
            }
            if !sleep.is_zero() && self.stop.wait_timeout(sleep) {
                break StopReason::Signalled;
            }
        };

        let summary = RunSummary {
            resumes: self.scheduler.resumes() - start_resumes,
            elapsed: epoch.elapsed(),
            reason,
        };
        tracing::info!(
            resumes = summary.resumes,
            elapsed = ?summary.elapsed,
            reason = ?summary.reason,
            "driver stopped"
        );
        Ok(summary)
    }
}

impl Spawn for Driver {
    fn spawn(&mut self, chain: Box<dyn Chain>) -> ChainHandle {
        self.scheduler.spawn(chain)
    }
}
