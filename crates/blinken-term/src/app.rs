#![forbid(unsafe_code)]

//! Wiring: options to engine, player, driver and terminal.

use std::io::{self, BufWriter};
use std::time::Duration;

use blinken_core::{
    BlinkEngine, ChainHandle, EngineConfig, Indicator, PlayerConfig, Script, ScriptPlayer, SimRng,
    Spawn,
};
use blinken_runtime::{Driver, DriverConfig, RunSummary};

use crate::cli::Opts;
use crate::session::{SessionOptions, TerminalSession};
use crate::surface::{Layout, TerminalSurface};

/// The engine for the configured panel.
pub fn engine(opts: &Opts) -> BlinkEngine {
    let mut engine = BlinkEngine::new(EngineConfig {
        stagger_activity: opts.stagger,
    });
    for led in &opts.leds {
        engine.register(led.clone());
    }
    engine
}

pub fn player_config(opts: &Opts) -> PlayerConfig {
    PlayerConfig {
        max_lines: opts.max_lines,
        start_delay: Duration::from_millis(opts.start_delay_ms),
        ..PlayerConfig::default()
    }
}

/// Spawn every enabled component onto `spawner`.
///
/// Two streams are always forked from `rng`, panel first, so a given seed
/// drives the same panel whether or not the BBS is shown.
pub fn start(opts: &Opts, spawner: &mut dyn Spawn, rng: &mut SimRng) -> Vec<ChainHandle> {
    let mut panel_rng = rng.fork();
    let player_rng = rng.fork();
    let mut handles = Vec::new();
    if opts.show_leds {
        handles.extend(engine(opts).start(spawner, &mut panel_rng));
    }
    if opts.show_bbs {
        let player = ScriptPlayer::new(Script::bulletin_board(), player_config(opts), player_rng);
        handles.push(player.start(spawner));
    }
    if handles.is_empty() {
        tracing::warn!("nothing to show: indicators and BBS are both disabled");
    }
    handles
}

fn visible_leds(opts: &Opts) -> &[Indicator] {
    if opts.show_leds { opts.leds.as_slice() } else { &[] }
}

/// Run on the real terminal until SIGINT/SIGTERM or `exit_after_ms`.
///
/// # Errors
///
/// Returns terminal setup or output errors. The terminal is restored before
/// this returns in every case.
pub fn run(opts: &Opts) -> io::Result<RunSummary> {
    let mut rng = match opts.seed {
        Some(seed) => SimRng::seed_from_u64(seed),
        None => SimRng::from_entropy(),
    };
    tracing::info!(seed = ?opts.seed, leds = opts.leds.len(), "starting");

    let mut driver = Driver::new(DriverConfig {
        exit_after: (opts.exit_after_ms > 0).then(|| Duration::from_millis(opts.exit_after_ms)),
        ..DriverConfig::default()
    });
    start(opts, &mut driver, &mut rng);

    let session = TerminalSession::new(SessionOptions::default(), driver.stop_trigger())?;
    let layout = Layout::new(opts.max_lines, opts.show_leds, opts.show_bbs);
    let mut surface = TerminalSurface::new(BufWriter::new(io::stdout()), layout, visible_leds(opts));

    if let Ok((cols, rows)) = session.size() {
        let (need_cols, need_rows) = layout.size(surface.lamps_width());
        if cols < need_cols || rows < need_rows {
            tracing::warn!(cols, rows, need_cols, need_rows, "terminal smaller than the panel");
        }
    }

    surface.present()?;
    let summary = driver.run(&mut surface, TerminalSurface::present);
    drop(surface);
    drop(session);
    summary
}
