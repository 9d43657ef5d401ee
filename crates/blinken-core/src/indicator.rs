#![forbid(unsafe_code)]

//! Indicator descriptors.
//!
//! An indicator is registered once and never destroyed. Its on/off state is
//! not stored here: the only writer is the indicator's own chain, which
//! pushes every change straight to the [`Surface`](crate::chain::Surface).

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Stable name of an indicator on the surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndicatorId(String);

impl IndicatorId {
    /// Wrap a name.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IndicatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IndicatorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Behavior profile selecting the state machine that drives an indicator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Profile {
    /// Mostly on, with rare brief flickers.
    Power,
    /// Disk access: idle gaps broken by bursts.
    Activity,
    /// Cassette load: pilot tone, then data blocks.
    Tape,
    /// Any other tag. Registered but never driven.
    Unknown(String),
}

impl Profile {
    /// Parse a profile tag. Never fails: unrecognized tags become
    /// [`Profile::Unknown`].
    pub fn parse(tag: &str) -> Self {
        match tag.trim() {
            "power" => Self::Power,
            "activity" => Self::Activity,
            "tape" => Self::Tape,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Tag as written in descriptors.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Power => "power",
            Self::Activity => "activity",
            Self::Tape => "tape",
            Self::Unknown(tag) => tag,
        }
    }

    /// Whether a chain exists for this profile.
    pub fn is_driven(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl FromStr for Profile {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered indicator light.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    id: IndicatorId,
    profile: Profile,
    /// Cosmetic only; no state machine reads it.
    color: Option<String>,
}

impl Indicator {
    /// Create an indicator without a color tag.
    pub fn new(id: impl Into<IndicatorId>, profile: Profile) -> Self {
        Self {
            id: id.into(),
            profile,
            color: None,
        }
    }

    /// Attach a color tag.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn id(&self) -> &IndicatorId {
        &self.id
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }
}

impl From<String> for IndicatorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
