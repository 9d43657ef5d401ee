#![forbid(unsafe_code)]

//! Runtime: the timer queue that drives chains, over real or virtual time.
//!
//! - [`Scheduler`] owns the queue and the virtual clock.
//! - [`Driver`] runs a scheduler against the wall clock, sleeping on a stop
//!   signal between wakeups.
//! - [`Simulator`] runs a scheduler on a hand-cranked clock and records
//!   every surface call, for tests.

pub mod driver;
pub mod scheduler;
pub mod simulator;

pub use driver::{Driver, DriverConfig, RunSummary, StopReason};
pub use scheduler::Scheduler;
pub use simulator::{RecordingSurface, Simulator, SurfaceEvent};
