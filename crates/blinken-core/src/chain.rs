#![forbid(unsafe_code)]

//! Chains: the unit of cooperative scheduling.
//!
//! A [`Chain`] is an explicit state machine. Each call to
//! [`Chain::resume`] performs the side effects due at the current instant
//! and then either asks to be resumed after a delay or finishes. There is
//! no nesting: a burst inside a disk-activity cycle inside a forever loop is
//! a single flat state value, and the scheduler only ever sees one pending
//! wakeup per chain.
//!
//! # Invariants
//!
//! 1. Within one chain, resumes are strictly sequential.
//! 2. Between two resumes of the same chain, at least the requested delay
//!    has elapsed on the scheduler clock.
//! 3. Side effects only happen inside `resume`, through the [`Context`].

use std::fmt;
use std::time::Duration;

use crate::indicator::IndicatorId;
use crate::stop::StopTrigger;

/// What a chain wants after a resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// Suspend, then resume after this delay.
    After(Duration),
    /// The chain is complete and will not be resumed again.
    Finished,
}

/// The visual surface both subsystems paint on.
///
/// Both operations are fire-and-forget; nothing the surface does feeds back
/// into scheduling.
pub trait Surface {
    /// Turn an indicator's light on or off.
    fn set_on(&mut self, id: &IndicatorId, on: bool);

    /// Paint the terminal buffer with an optional cursor after the last character.
    fn render(&mut self, text: &str, cursor_visible: bool);
}

/// Per-resume view of the world handed to a chain.
pub struct Context<'a> {
    now: Duration,
    surface: &'a mut dyn Surface,
}

impl<'a> Context<'a> {
    /// Create a context at `now` (time since the scheduler epoch).
    pub fn new(now: Duration, surface: &'a mut dyn Surface) -> Self {
        Self { now, surface }
    }

    /// Scheduler time at which this resume happens.
    #[inline]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Forward to [`Surface::set_on`].
    pub fn set_on(&mut self, id: &IndicatorId, on: bool) {
        self.surface.set_on(id, on);
    }

    /// Forward to [`Surface::render`].
    pub fn render(&mut self, text: &str, cursor_visible: bool) {
        self.surface.render(text, cursor_visible);
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("now", &self.now).finish()
    }
}

/// A resumable state machine driven by a scheduler.
pub trait Chain {
    /// Short label for logs.
    fn label(&self) -> &str;

    /// Perform everything due now and say when to come back.
    fn resume(&mut self, cx: &mut Context<'_>) -> Resume;
}

/// Identifier assigned to a chain when it is spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(pub usize);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain#{}", self.0)
    }
}

/// Handle returned by [`Spawn::spawn`]; cancels the chain it names.
///
/// Dropping the handle does not cancel the chain.
#[derive(Debug, Clone)]
pub struct ChainHandle {
    id: ChainId,
    trigger: StopTrigger,
}

impl ChainHandle {
    /// Build a handle from the trigger half of the chain's stop pair.
    pub fn new(id: ChainId, trigger: StopTrigger) -> Self {
        Self { id, trigger }
    }

    /// The chain this handle controls.
    pub fn id(&self) -> ChainId {
        self.id
    }

    /// Ask the scheduler to drop the chain before its next resume.
    pub fn cancel(&self) {
        self.trigger.stop();
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.trigger.is_stopped()
    }
}

/// Anything that can accept new chains.
pub trait Spawn {
    /// Register a chain; its first resume is due immediately.
    fn spawn(&mut self, chain: Box<dyn Chain>) -> ChainHandle;
}
