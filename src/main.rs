//! Thornvale headless runner.
//!
//! Drives the default level with scripted input for a fixed number of
//! frames and logs the simulation events as they fire. Useful for soak
//! testing the core without a renderer attached.

use thornvale::consts::REFERENCE_DT;
use thornvale::sim::{Action, InputFrame, Level, LevelData, SimClock, SimulationContext};
use thornvale::tuning::Tuning;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0xC0FFEE);
    let frames: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(1800);
    let level_path = args.next();

    let mut ctx = SimulationContext::new(seed, Tuning::default());
    let mut level = match level_path {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| LevelData::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(data) => Level::from_data(&data, &mut ctx),
            Err(err) => {
                log::warn!("could not load level {path:?} ({err}); using default level");
                Level::default_level(&mut ctx)
            }
        },
        None => Level::default_level(&mut ctx),
    };

    log::info!("seed {seed:#x}, running {frames} frames");

    let mut clock = SimClock::new();
    let mut input = InputFrame::new();
    for frame in 0..frames {
        // Scripted input: run right, hop every second and a half
        let mut bits = InputFrame::pack(&[Action::Right, Action::Run]);
        if frame % 90 < 12 {
            bits |= InputFrame::pack(&[Action::Jump]);
        }
        input.step(bits);

        clock.advance(&mut level, &mut ctx, &input, REFERENCE_DT);

        for event in ctx.drain_events() {
            log::info!("frame {:5}: {event:?}", clock.frame);
        }
        if level.completed || level.player_defeated {
            break;
        }
    }

    let outcome = if level.completed {
        "completed"
    } else if level.player_defeated {
        "defeated"
    } else {
        "timed out"
    };
    println!(
        "{outcome} after {} frames | score {} | coins {} | {} entities",
        clock.frame,
        level.score,
        level.coins,
        level.entities().len()
    );
}
