#![forbid(unsafe_code)]

//! Blink engine: indicator registration and profile dispatch.
//!
//! Two reusable sub-machines, [`Burst`] and [`SteadyBlink`], are composed by
//! the per-profile chains in [`profiles`]. [`BlinkEngine::start`] hands each
//! registered indicator to the chain for its profile; indicators with an
//! unrecognized profile are registered but never driven, so they stay off
//! for the whole run.
//!
//! # Example
//!
//! ```ignore
//! let mut engine = BlinkEngine::new(EngineConfig::default());
//! engine.register(Indicator::new("pwr", Profile::Power));
//! engine.register(Indicator::new("drive8", Profile::Activity));
//! let handles = engine.start(&mut scheduler, &mut SimRng::seed_from_u64(42));
//! ```

pub mod burst;
pub mod profiles;
pub mod steady;

use std::time::Duration;

use crate::chain::{Chain, ChainHandle, Spawn};
use crate::indicator::{Indicator, Profile};
use crate::rng::SimRng;

pub use burst::{Burst, BurstShape};
pub use profiles::{ActivityChain, PowerChain, TapeChain};
pub use steady::SteadyBlink;

/// Result of advancing a blink sub-machine by one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Come back after this long.
    Wait(Duration),
    /// The pattern is over and the light is off.
    Done,
}

/// Engine-wide knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Random initial offset for activity lights so twin drives never sync.
    pub stagger_activity: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stagger_activity: true,
        }
    }
}

/// Owns the registered indicators.
#[derive(Debug, Default)]
pub struct BlinkEngine {
    indicators: Vec<Indicator>,
    config: EngineConfig,
}

impl BlinkEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            indicators: Vec::new(),
            config,
        }
    }

    /// Add an indicator. No validation: any profile is accepted.
    pub fn register(&mut self, indicator: Indicator) {
        crate::debug!(
            led = %indicator.id(),
            profile = %indicator.profile(),
            "indicator registered"
        );
        self.indicators.push(indicator);
    }

    /// Registered indicators in registration order.
    pub fn indicators(&self) -> &[Indicator] {
        &self.indicators
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Spawn one infinite chain per driven indicator.
    ///
    /// Each indicator (driven or not) consumes one fork of `rng` in
    /// registration order, so a run is fully determined by the seed and the
    /// registration list.
    pub fn start(&self, spawner: &mut dyn Spawn, rng: &mut SimRng) -> Vec<ChainHandle> {
        let mut handles = Vec::new();
        for indicator in &self.indicators {
            let chain_rng = rng.fork();
            match chain_for(indicator, chain_rng, self.config) {
                Some(chain) => handles.push(spawner.spawn(chain)),
                None => {
                    crate::debug!(
                        led = %indicator.id(),
                        profile = %indicator.profile(),
                        "unknown profile; indicator stays inert"
                    );
                }
            }
        }
        crate::info!(
            registered = self.indicators.len(),
            driven = handles.len(),
            "blink engine started"
        );
        handles
    }
}

/// The chain for an indicator's profile, or `None` for an unknown profile.
pub fn chain_for(indicator: &Indicator, rng: SimRng, config: EngineConfig) -> Option<Box<dyn Chain>> {
    let id = indicator.id().clone();
    match indicator.profile() {
        Profile::Power => Some(Box::new(PowerChain::new(id, rng))),
        Profile::Activity => Some(Box::new(ActivityChain::new(
            id,
            rng,
            config.stagger_activity,
        ))),
        Profile::Tape => Some(Box::new(TapeChain::new(id, rng))),
        Profile::Unknown(_) => None,
    }
}
