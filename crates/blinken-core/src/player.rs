#![forbid(unsafe_code)]

//! Script player: types a [`Script`] onto the surface forever.
//!
//! The player is one [`Chain`]. Its cursor is `(screen, op, offset)` where
//! `offset` is a byte offset into the current [`Op::Type`] text, always on a
//! grapheme boundary. Every resume does as much zero-time work as it can
//! (clears, spaces, line breaks, zero waits) and suspends at the first
//! op that takes time.
//!
//! # Invariants
//!
//! 1. After every render, the buffer holds at most `max_lines` lines.
//! 2. Screens play strictly in order; after the last one playback wraps to
//!    the first and the cycle counter increments.
//! 3. Only visible graphemes suspend: spaces and line breaks are appended
//!    and rendered without a pause.
//!
//! # Failure Modes
//!
//! A script in which nothing suspends would spin inside one resume forever.
//! [`Script::new`] rejects such scripts, so the player never sees one.

use std::borrow::Cow;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use unicode_segmentation::UnicodeSegmentation;

use crate::chain::{Chain, ChainHandle, Context, Resume, Spawn};
use crate::rng::{DelayRange, SimRng};
use crate::script::{Op, Script, is_delay_exempt};

/// Upper bound of the per-character jitter, as a fraction of the base delay.
pub const TYPE_JITTER: f64 = 0.4;

/// Scrollback kept on screen by default.
pub const DEFAULT_MAX_LINES: usize = 17;

/// Pause before the first screen by default.
pub const DEFAULT_START_DELAY: Duration = Duration::from_millis(800);

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// Text shown on the terminal, trimmed to the newest `max_lines` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBuffer {
    content: String,
    max_lines: usize,
}

impl ScriptBuffer {
    /// `max_lines` of zero is treated as one.
    pub fn new(max_lines: usize) -> Self {
        Self {
            content: String::new(),
            max_lines: max_lines.max(1),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    /// Number of `'\n'`-delimited lines; an empty buffer is one empty line.
    pub fn line_count(&self) -> usize {
        self.content.matches('\n').count() + 1
    }

    /// Append text, then drop the oldest lines beyond `max_lines`.
    pub fn push(&mut self, text: &str) {
        self.content.push_str(text);
        self.trim();
    }

    pub fn clear(&mut self) {
        self.content.clear();
    }

    fn trim(&mut self) {
        let excess = self.line_count().saturating_sub(self.max_lines);
        if excess == 0 {
            return;
        }
        let cut = self
            .content
            .match_indices('\n')
            .nth(excess - 1)
            .map_or(self.content.len(), |(idx, _)| idx + 1);
        self.content.drain(..cut);
    }
}

// ---------------------------------------------------------------------------
// Configuration and position
// ---------------------------------------------------------------------------

/// Player knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerConfig {
    pub max_lines: usize,
    /// Pause before the first screen of the first cycle.
    pub start_delay: Duration,
    /// Paint a cursor after the last character.
    pub cursor: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_lines: DEFAULT_MAX_LINES,
            start_delay: DEFAULT_START_DELAY,
            cursor: true,
        }
    }
}

/// Where playback is: completed cycles and the current screen index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub cycle: u64,
    pub screen: usize,
}

/// Read-only view of a running player's position.
///
/// Obtained from [`ScriptPlayer::watch`] before the player is handed to a
/// scheduler.
#[derive(Debug, Clone)]
pub struct PlayerWatch {
    position: Rc<Cell<Position>>,
    names: Rc<[Cow<'static, str>]>,
}

impl PlayerWatch {
    pub fn position(&self) -> Position {
        self.position.get()
    }

    /// Name of the screen currently playing.
    pub fn screen_name(&self) -> &str {
        self.names
            .get(self.position.get().screen)
            .map_or("", |name| &**name)
    }
}

// ---------------------------------------------------------------------------
// Player chain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before the start delay.
    Boot,
    /// About to clear and start the current screen.
    Enter,
    /// Inside the current screen's ops.
    Run,
}

/// The playback chain.
#[derive(Debug)]
pub struct ScriptPlayer {
    script: Script,
    config: PlayerConfig,
    rng: SimRng,
    buffer: ScriptBuffer,
    state: State,
    op: usize,
    offset: usize,
    position: Rc<Cell<Position>>,
    names: Rc<[Cow<'static, str>]>,
}

impl ScriptPlayer {
    pub fn new(script: Script, config: PlayerConfig, rng: SimRng) -> Self {
        let names: Rc<[Cow<'static, str>]> = script
            .screens()
            .iter()
            .map(|screen| Cow::Owned(screen.name().to_string()))
            .collect();
        Self {
            buffer: ScriptBuffer::new(config.max_lines),
            script,
            config,
            rng,
            state: State::Boot,
            op: 0,
            offset: 0,
            position: Rc::new(Cell::new(Position::default())),
            names,
        }
    }

    /// Hand the player to a scheduler. The first screen starts after
    /// [`PlayerConfig::start_delay`].
    pub fn start(self, spawner: &mut dyn Spawn) -> ChainHandle {
        crate::info!(
            screens = self.script.len(),
            max_lines = self.buffer.max_lines(),
            "script player started"
        );
        spawner.spawn(Box::new(self))
    }

    pub fn position(&self) -> Position {
        self.position.get()
    }

    pub fn screen_name(&self) -> &str {
        self.script
            .screens()
            .get(self.position.get().screen)
            .map_or("", |screen| screen.name())
    }

    /// A handle that keeps reporting the position after `start`.
    pub fn watch(&self) -> PlayerWatch {
        PlayerWatch {
            position: Rc::clone(&self.position),
            names: Rc::clone(&self.names),
        }
    }

    pub fn buffer(&self) -> &ScriptBuffer {
        &self.buffer
    }

    fn next_screen(&mut self) {
        let mut pos = self.position.get();
        pos.screen += 1;
        if pos.screen >= self.script.len() {
            pos.screen = 0;
            pos.cycle += 1;
            crate::debug!(cycle = pos.cycle, "script wrapped");
        }
        self.position.set(pos);
        self.state = State::Enter;
    }

    fn type_delay(&mut self, base_delay_ms: u64) -> Duration {
        let base = base_delay_ms as f64;
        self.rng
            .delay(DelayRange::new(base, base * (1.0 + TYPE_JITTER)))
    }
}

impl Chain for ScriptPlayer {
    fn label(&self) -> &str {
        "bbs"
    }

    fn resume(&mut self, cx: &mut Context<'_>) -> Resume {
        loop {
            match self.state {
                State::Boot => {
                    self.state = State::Enter;
                    if !self.config.start_delay.is_zero() {
                        return Resume::After(self.config.start_delay);
                    }
                }
                State::Enter => {
                    self.buffer.clear();
                    cx.render(self.buffer.content(), self.config.cursor);
                    self.op = 0;
                    self.offset = 0;
                    self.state = State::Run;
                    crate::trace!(screen = self.screen_name(), "screen entered");
                }
                State::Run => {
                    let screen = self.position.get().screen;
                    let Some(op) = self
                        .script
                        .screens()
                        .get(screen)
                        .and_then(|s| s.ops().get(self.op))
                    else {
                        self.next_screen();
                        continue;
                    };
                    match op {
                        Op::Wait { ms } => {
                            let ms = *ms;
                            self.op += 1;
                            self.offset = 0;
                            if ms > 0 {
                                return Resume::After(Duration::from_millis(ms));
                            }
                        }
                        Op::Type {
                            text,
                            base_delay_ms,
                        } => {
                            let base_delay_ms = *base_delay_ms;
                            let Some(grapheme) = text[self.offset..].graphemes(true).next() else {
                                self.op += 1;
                                self.offset = 0;
                                continue;
                            };
                            self.offset += grapheme.len();
                            self.buffer.push(grapheme);
                            cx.render(self.buffer.content(), self.config.cursor);
                            if base_delay_ms > 0 && !is_delay_exempt(grapheme) {
                                return Resume::After(self.type_delay(base_delay_ms));
                            }
                        }
                    }
                }
            }
        }
    }
}
