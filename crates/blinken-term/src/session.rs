#![forbid(unsafe_code)]

//! Terminal session lifecycle guard.
//!
//! [`TerminalSession`] owns every terminal mode the program changes and
//! restores them on drop, including during panic unwinding.
//!
//! The terminal stays in cooked mode: nothing reads input, and Ctrl+C reaches
//! the process as SIGINT.
//!
//! # Lifecycle Guarantees
//!
//! 1. Each mode (alt-screen, hidden cursor) has a flag set only after it
//!    was successfully enabled, and only flagged modes are undone.
//! 2. Drop restores state in reverse order of enabling.
//! 3. A panic hook performs a best-effort restore before the default hook
//!    prints, so the panic message lands on the normal screen.
//! 4. SIGINT/SIGTERM never exit the process directly: they trip the run's
//!    [`StopTrigger`], the driver returns, and the session is dropped
//!    normally.
//!
//! # Cleanup Order
//!
//! 1. Stop the signal thread
//! 2. Show cursor (if hidden)
//! 3. Leave alternate screen (if enabled)
//! 4. Flush stdout

use std::io::{self, Write};
use std::sync::OnceLock;

use blinken_core::StopTrigger;

#[cfg(unix)]
use signal_hook::consts::signal::{SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;
#[cfg(unix)]
use std::thread::{self, JoinHandle};

/// Terminal modes to enable.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Switch to the alternate screen buffer (`CSI ? 1049 h`).
    pub alternate_screen: bool,
    /// Hide the hardware cursor (`CSI ? 25 l`).
    pub hide_cursor: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            alternate_screen: true,
            hide_cursor: true,
        }
    }
}

/// RAII guard for the terminal.
#[derive(Debug)]
pub struct TerminalSession {
    alternate_screen_enabled: bool,
    cursor_hidden: bool,
    #[cfg(unix)]
    signal_guard: Option<SignalGuard>,
}

impl TerminalSession {
    /// Enable the requested modes. `stop` is tripped on SIGINT/SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if any mode cannot be enabled; modes enabled so far
    /// are restored by the drop of the partially built session.
    pub fn new(options: SessionOptions, stop: StopTrigger) -> io::Result<Self> {
        install_panic_hook();

        let mut session = Self {
            alternate_screen_enabled: false,
            cursor_hidden: false,
            #[cfg(unix)]
            signal_guard: Some(SignalGuard::new(stop)?),
        };
        #[cfg(not(unix))]
        drop(stop);

        let mut stdout = io::stdout();

        if options.alternate_screen {
            crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
            session.alternate_screen_enabled = true;
            tracing::info!("alternate screen enabled");
        }

        if options.hide_cursor {
            crossterm::execute!(stdout, crossterm::cursor::Hide)?;
            session.cursor_hidden = true;
        }

        crossterm::execute!(
            stdout,
            crossterm::terminal::Clear(crossterm::terminal::ClearType::All)
        )?;

        Ok(session)
    }

    /// Current terminal size (columns, rows).
    pub fn size(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }

    fn cleanup(&mut self) {
        #[cfg(unix)]
        drop(self.signal_guard.take());

        let mut stdout = io::stdout();
        let _ = crossterm::execute!(stdout, crossterm::style::ResetColor);

        if self.cursor_hidden {
            let _ = crossterm::execute!(stdout, crossterm::cursor::Show);
            self.cursor_hidden = false;
        }

        if self.alternate_screen_enabled {
            let _ = crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen);
            self.alternate_screen_enabled = false;
            tracing::info!("alternate screen disabled");
        }

        let _ = stdout.flush();
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            best_effort_cleanup();
            previous(info);
        }));
    });
}

fn best_effort_cleanup() {
    let mut stdout = io::stdout();
    let _ = crossterm::execute!(stdout, crossterm::style::ResetColor);
    let _ = crossterm::execute!(stdout, crossterm::cursor::Show);
    let _ = crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen);
    let _ = stdout.flush();
}

#[cfg(unix)]
#[derive(Debug)]
struct SignalGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<JoinHandle<()>>,
}

#[cfg(unix)]
impl SignalGuard {
    fn new(stop: StopTrigger) -> io::Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(io::Error::other)?;
        let handle = signals.handle();
        let thread = thread::spawn(move || {
            for signal in signals.forever() {
                if matches!(signal, SIGINT | SIGTERM) {
                    tracing::warn!(signal, "termination signal received, stopping");
                    stop.stop();
                }
            }
        });
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

#[cfg(unix)]
impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
