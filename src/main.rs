//! Deeper entry point
//!
//! Headless runner: builds a world from settings and drives it with a
//! scripted, seeded input pattern. Usage: `deeper [settings.json]`.

use std::path::PathBuf;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use deeper::sim::{TickInput, WorldState, tick};
use deeper::{Settings, TickReport};

/// Ticks each scripted key combination is held for
const HOLD_TICKS: u64 = 30;

/// Pick the next held-key combination for the scripted walk
fn next_input(rng: &mut Pcg32) -> TickInput {
    match rng.random_range(0..6) {
        0 => TickInput {
            right: true,
            ..Default::default()
        },
        1 => TickInput {
            down: true,
            ..Default::default()
        },
        2 => TickInput {
            left: true,
            ..Default::default()
        },
        3 => TickInput {
            up: true,
            ..Default::default()
        },
        4 => TickInput {
            up: rng.random(),
            down: rng.random(),
            left: rng.random(),
            right: rng.random(),
            wait: false,
        },
        _ => TickInput::default(),
    }
}

fn log_report(state: &WorldState, report: &TickReport) {
    for hit in &report.hits {
        log::trace!(
            "tick {}: {:?} hit {:?} for {} ({} left)",
            state.time_ticks,
            hit.attacker,
            hit.target,
            hit.damage,
            hit.remaining
        );
    }
    for id in &report.defeated {
        log::info!("tick {}: NPC {:?} defeated", state.time_ticks, id);
    }
}

fn main() {
    env_logger::init();
    log::info!("Deeper (headless) starting...");

    let path = std::env::args().nth(1).map(PathBuf::from);
    let settings = Settings::load_or_default(path.as_deref());

    let mut state = WorldState::new(&settings);
    let mut rng = Pcg32::seed_from_u64(settings.seed.wrapping_add(1));
    let mut input = TickInput::default();
    let mut defeated = 0usize;
    let mut contacts = 0u64;

    for t in 0..settings.ticks {
        if t % HOLD_TICKS == 0 {
            input = next_input(&mut rng);
            log::debug!("tick {}: holding {:?}", state.time_ticks, input);
        }
        let report = tick(&mut state, &input, &settings.tuning);
        defeated += report.defeated.len();
        contacts += u64::from(report.tile_contacts);
        log_report(&state, &report);
    }

    log::info!(
        "Ran {} ticks: player at ({:.2}, {:.2}), {} NPCs defeated, {} remaining, {} wall contacts, dilation {:.3}",
        state.time_ticks,
        state.player.pos.x,
        state.player.pos.y,
        defeated,
        state.npcs.len(),
        contacts,
        state.time_dilation
    );
}
