//! The terminal surface driven by the real scheduler, writing into memory.

use std::time::Duration;

use blinken_core::{PlayerConfig, Script, ScriptPlayer, SimRng, Spawn};
use blinken_runtime::Scheduler;
use blinken_term::app;
use blinken_term::cli::Opts;
use blinken_term::surface::{Layout, TerminalSurface};

fn surface(opts: &Opts) -> TerminalSurface<Vec<u8>> {
    let layout = Layout::new(opts.max_lines, opts.show_leds, opts.show_bbs);
    TerminalSurface::new(Vec::new(), layout, &opts.leds)
}

#[test]
fn session_paints_banner_and_lamps() {
    let opts = Opts::default();
    let mut surface = surface(&opts);
    let mut sched = Scheduler::new();
    app::start(&opts, &mut sched, &mut SimRng::seed_from_u64(6));

    let mut t = Duration::ZERO;
    while t < Duration::from_secs(4) {
        t += Duration::from_millis(16);
        if sched.run_until(t, &mut surface) > 0 {
            surface.present().unwrap();
        }
    }

    assert_eq!(surface.is_lit("power"), Some(true));
    assert!(surface.text().starts_with("================================\n"));
}

#[test]
fn text_mirrors_the_player_buffer() {
    let opts = Opts {
        max_lines: 5,
        show_leds: false,
        ..Opts::default()
    };
    let mut surface = surface(&opts);
    let mut sched = Scheduler::new();
    let config = PlayerConfig {
        max_lines: 5,
        start_delay: Duration::ZERO,
        ..PlayerConfig::default()
    };
    let player = ScriptPlayer::new(Script::bulletin_board(), config, SimRng::seed_from_u64(1));
    sched.spawn(Box::new(player));

    sched.run_until(Duration::from_secs(12), &mut surface);
    surface.present().unwrap();
    assert!(surface.text().split('\n').count() <= 5);
}
