#![forbid(unsafe_code)]

//! Terminal front end: an indicator panel and a scripted BBS session drawn
//! with crossterm.
//!
//! The binary is a thin shell over [`app::run`]; the pieces are public so
//! the wiring can be exercised against the runtime's simulator.

pub mod app;
pub mod cli;
pub mod logging;
pub mod session;
pub mod surface;

pub use cli::{CliError, Command, Opts};
pub use surface::{Layout, TerminalSurface};
