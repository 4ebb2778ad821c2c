//! Headless runner
//!
//! Drives a session with scripted input and logs what happens. Usage:
//! `emberfall [seed] [seconds] [mode]`. Set `RUST_LOG=info` (or `debug`)
//! to see simulation logs.

use std::path::Path;

use emberfall::consts::SIM_DT;
use emberfall::persistence::{JsonFileStore, PendingLoad};
use emberfall::sim::{GamePhase, SimEvent, Upgrade};
use emberfall::{GameData, GameMode, Session, Settings};
use glam::Vec2;

const SETTINGS_PATH: &str = "emberfall_settings.json";
const PROGRESS_PATH: &str = "emberfall_progress.json";

const UPGRADE_ROTATION: [Upgrade; 4] = [Upgrade::Damage, Upgrade::Speed, Upgrade::Armor, Upgrade::Regen];

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(0xE3BE_F411);
    let seconds: f32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(120.0);

    let mut settings = Settings::load(Path::new(SETTINGS_PATH));
    if let Some(mode) = args.next().as_deref().and_then(GameMode::from_str) {
        settings.mode = mode;
    }
    log::info!("Emberfall (headless) starting: seed={seed} mode={}", settings.mode.as_str());

    let store = JsonFileStore::new(PROGRESS_PATH);
    let pending = PendingLoad::spawn(store.clone());
    let mut session = match Session::new(GameData::builtin(), settings, store, pending, seed) {
        Ok(session) => session,
        Err(err) => {
            log::error!("cannot start session: {err}");
            std::process::exit(1);
        }
    };

    let frames = (seconds / SIM_DT) as u32;
    let mut kills = 0u32;
    let mut upgrades = 0usize;
    for frame in 0..frames {
        let t = frame as f32 * SIM_DT;
        let input = session.input_mut();
        // Slow circle with a hop every couple of seconds
        input.axis = Vec2::from_angle(t * 0.3);
        input.jump = frame % 150 == 0;
        if session.state().player.pending_upgrades > 0 {
            session.input_mut().upgrade = Some(UPGRADE_ROTATION[upgrades % UPGRADE_ROTATION.len()]);
            upgrades += 1;
        }

        for event in session.update(SIM_DT) {
            match event {
                SimEvent::EntityKilled { .. } => kills += 1,
                SimEvent::PlayerLeveledUp { .. }
                | SimEvent::BossDefeated { .. }
                | SimEvent::TierCompleted { .. }
                | SimEvent::OvertimeStarted { .. }
                | SimEvent::PlayerDied => log::info!("{event:?}"),
                _ => log::trace!("{}", event.name()),
            }
        }
        session.take_snapshots();

        if session.state().phase == GamePhase::GameOver {
            break;
        }
    }

    let state = session.state();
    let loadout: Vec<String> = state
        .player
        .weapons
        .iter()
        .map(|w| format!("{} L{}", w.kind.as_str(), w.level))
        .collect();
    println!(
        "tier {} | level {} | hp {:.0}/{:.0} | kills {} | live entities {} | weapons [{}] | {:.1}s simulated",
        state.tier.tier,
        state.player.level,
        state.player.health.max(0.0),
        state.player.max_health,
        kills,
        state.entities.len(),
        loadout.join(", "),
        state.clock.elapsed,
    );
}
