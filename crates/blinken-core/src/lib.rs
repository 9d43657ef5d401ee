#![forbid(unsafe_code)]

//! Core: blink-pattern state machines, scripted terminal playback, and the
//! scheduling seams they run on.
//!
//! Everything here is a plain state machine. Nothing in this crate sleeps or
//! owns a clock; a scheduler (see `blinken-runtime`) resumes each [`Chain`]
//! when its requested delay has elapsed and hands it a [`Context`] carrying
//! the current time and the [`Surface`] to paint on.
//!
//! [`Chain`]: chain::Chain
//! [`Context`]: chain::Context
//! [`Surface`]: chain::Surface

pub mod blink;
pub mod chain;
pub mod indicator;
pub mod logging;
pub mod player;
pub mod rng;
pub mod script;
pub mod stop;

#[cfg(test)]
mod test_support;

pub use blink::{BlinkEngine, EngineConfig};
pub use chain::{Chain, ChainHandle, ChainId, Context, Resume, Spawn, Surface};
pub use indicator::{Indicator, IndicatorId, Profile};
pub use player::{PlayerConfig, PlayerWatch, Position, ScriptBuffer, ScriptPlayer};
pub use rng::{DelayRange, SimRng};
pub use script::{Op, Screen, Script, ScriptError};
pub use stop::{StopSignal, StopTrigger};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, info, trace, warn};
