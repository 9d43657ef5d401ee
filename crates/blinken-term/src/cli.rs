#![forbid(unsafe_code)]

//! Command-line argument parsing for `blinkenbbs`.
//!
//! Parses args manually to keep the binary lean. Environment variables with
//! the `BLINKENBBS_` prefix provide defaults; explicit flags override them.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::process;

use blinken_core::{Indicator, Profile};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HELP_TEXT: &str = "\
blinkenbbs - retro indicator panel and dial-up BBS session for the terminal

USAGE:
    blinkenbbs [OPTIONS]

OPTIONS:
    --led=ID:PROFILE[:COLOR]  Add an indicator (repeatable; replaces the default panel)
    --seed=N                  Seed every random delay (default: from the OS)
    --max-lines=N             BBS scrollback height in lines (default: 17)
    --start-delay-ms=N        Pause before the first screen (default: 800)
    --no-stagger              Start activity lights without a random offset
    --no-leds                 Hide the indicator panel
    --no-bbs                  Hide the BBS screen
    --exit-after-ms=N         Quit after N milliseconds (0 = run forever)
    --log-file=PATH           Write tracing output to PATH
    --help, -h                Show this help message
    --version, -V             Show version

PROFILES:
    power      Steady on with a rare flicker
    activity   Disk access bursts, sometimes doubled
    tape       Header tone, then data blocks
    (anything else registers an indicator that stays off)

COLORS:
    red, green, amber, yellow, orange, blue, white

STOPPING:
    Ctrl+C (SIGINT), SIGTERM, or --exit-after-ms. Keyboard input is not read.

ENVIRONMENT VARIABLES:
    BLINKENBBS_SEED            Override --seed
    BLINKENBBS_MAX_LINES       Override --max-lines
    BLINKENBBS_EXIT_AFTER_MS   Override --exit-after-ms
    BLINKENBBS_LOG_FILE        Override --log-file
    BLINKENBBS_LOG             Log filter directive (default: info)";

/// Indicators used when no `--led` is given.
pub const DEFAULT_PANEL: [&str; 4] = [
    "power:power:red",
    "drive8:activity:green",
    "drive9:activity:green",
    "tape:tape:amber",
];

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Indicator panel, in registration order.
    pub leds: Vec<Indicator>,
    /// Fixed seed; `None` draws one from the OS.
    pub seed: Option<u64>,
    pub max_lines: usize,
    pub start_delay_ms: u64,
    pub stagger: bool,
    pub show_leds: bool,
    pub show_bbs: bool,
    /// Auto-exit after this many milliseconds (0 = disabled).
    pub exit_after_ms: u64,
    pub log_file: Option<PathBuf>,
    /// `EnvFilter` directive for the log file.
    pub log_filter: Option<String>,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            leds: default_panel(),
            seed: None,
            max_lines: 17,
            start_delay_ms: 800,
            stagger: true,
            show_leds: true,
            show_bbs: true,
            exit_after_ms: 0,
            log_file: None,
            log_filter: None,
        }
    }
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(Opts),
    Help,
    Version,
}

/// A rejected argument or environment value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// A numeric flag or variable did not parse.
    InvalidValue { name: String, value: String },
    /// A `--led` descriptor is malformed.
    InvalidLed(String),
    UnknownArgument(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { name, value } => write!(f, "Invalid {name} value: {value}"),
            Self::InvalidLed(desc) => {
                write!(f, "Invalid --led descriptor: {desc} (expected ID:PROFILE[:COLOR])")
            }
            Self::UnknownArgument(arg) => write!(f, "Unknown argument: {arg}"),
        }
    }
}

impl std::error::Error for CliError {}

/// Parse an `ID:PROFILE[:COLOR]` descriptor.
///
/// An unrecognized profile is accepted; the indicator is registered but
/// never driven.
pub fn parse_led(desc: &str) -> Result<Indicator, CliError> {
    let invalid = || CliError::InvalidLed(desc.to_string());
    let mut parts = desc.split(':').map(str::trim);
    let id = parts.next().filter(|id| !id.is_empty()).ok_or_else(invalid)?;
    let profile = parts.next().filter(|p| !p.is_empty()).ok_or_else(invalid)?;
    let color = parts.next();
    if parts.next().is_some() {
        return Err(invalid());
    }
    let indicator = Indicator::new(id, Profile::parse(profile));
    Ok(match color.filter(|c| !c.is_empty()) {
        Some(color) => indicator.with_color(color),
        None => indicator,
    })
}

pub fn default_panel() -> Vec<Indicator> {
    DEFAULT_PANEL
        .iter()
        .filter_map(|desc| parse_led(desc).ok())
        .collect()
}

fn number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, CliError> {
    value.trim().parse().map_err(|_| CliError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    })
}

impl Opts {
    /// Parse process arguments and environment; prints help, version, or
    /// errors and exits when appropriate.
    pub fn parse() -> Self {
        match Self::parse_from(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(Command::Run(opts)) => opts,
            Ok(Command::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Command::Version) => {
                println!("blinkenbbs {VERSION}");
                process::exit(0);
            }
            Err(err) => {
                eprintln!("{err}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Parse `args` (without the program name) on top of variables looked up
    /// through `var`.
    ///
    /// # Errors
    ///
    /// Returns the first malformed value, descriptor, or unknown flag.
    pub fn parse_from<I, F>(args: I, var: F) -> Result<Command, CliError>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        // Apply environment variable defaults first
        if let Some(val) = var("BLINKENBBS_SEED") {
            opts.seed = Some(number("BLINKENBBS_SEED", &val)?);
        }
        if let Some(val) = var("BLINKENBBS_MAX_LINES") {
            opts.max_lines = number("BLINKENBBS_MAX_LINES", &val)?;
        }
        if let Some(val) = var("BLINKENBBS_EXIT_AFTER_MS") {
            opts.exit_after_ms = number("BLINKENBBS_EXIT_AFTER_MS", &val)?;
        }
        if let Some(val) = var("BLINKENBBS_LOG_FILE")
            && !val.is_empty()
        {
            opts.log_file = Some(PathBuf::from(val));
        }
        if let Some(val) = var("BLINKENBBS_LOG")
            && !val.is_empty()
        {
            opts.log_filter = Some(val);
        }

        // Parse command-line args (override env vars)
        let mut leds = Vec::new();
        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(Command::Help),
                "--version" | "-V" => return Ok(Command::Version),
                "--no-stagger" => opts.stagger = false,
                "--no-leds" => opts.show_leds = false,
                "--no-bbs" => opts.show_bbs = false,
                other => {
                    if let Some(val) = other.strip_prefix("--led=") {
                        leds.push(parse_led(val)?);
                    } else if let Some(val) = other.strip_prefix("--seed=") {
                        opts.seed = Some(number("--seed", val)?);
                    } else if let Some(val) = other.strip_prefix("--max-lines=") {
                        opts.max_lines = number("--max-lines", val)?;
                    } else if let Some(val) = other.strip_prefix("--start-delay-ms=") {
                        opts.start_delay_ms = number("--start-delay-ms", val)?;
                    } else if let Some(val) = other.strip_prefix("--exit-after-ms=") {
                        opts.exit_after_ms = number("--exit-after-ms", val)?;
                    } else if let Some(val) = other.strip_prefix("--log-file=") {
                        opts.log_file = Some(PathBuf::from(val));
                    } else {
                        return Err(CliError::UnknownArgument(other.to_string()));
                    }
                }
            }
        }
        if !leds.is_empty() {
            opts.leds = leds;
        }

        Ok(Command::Run(opts))
    }
}
