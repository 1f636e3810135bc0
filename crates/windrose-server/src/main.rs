//! Headless demo driver: generates a world, seats AI civs, scripts a few
//! representative actions, advances rounds, and writes a snapshot. Useful
//! as a smoke run and as a reference for wiring a real transport.

use std::path::PathBuf;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use windrose_core::MapGenConfig;
use windrose_protocol::{Action, CivId, ImprovementKind};
use windrose_server::{snapshot_session, write_save, GameSession, ServerConfig};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let save_dir = std::env::var("WINDROSE_SAVE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("saves"));
    let seed = std::env::var("WINDROSE_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(7);

    let config = ServerConfig {
        save_dir: save_dir.clone(),
        map: MapGenConfig {
            seed,
            ..MapGenConfig::default()
        },
        ..ServerConfig::default()
    };

    let mut session = GameSession::new(config);
    session.add_ai("aurelia".into()).expect("seat available");
    session.add_ai("borealis".into()).expect("seat available");
    if let Err(err) = session.start() {
        warn!(%err, "could not start demo game");
        return;
    }

    // Script a little economy for civ 0: settle where its settler stands,
    // then put a farm into construction next door.
    let settler_pos = session
        .world()
        .and_then(|world| world.unit_positions(CivId(0)).first().copied());
    if let Some(at) = settler_pos {
        session.handle_action(
            CivId(0),
            Action::SettleCity {
                at,
                name: "Kestrel Landing".into(),
            },
        );
        let farm_site = session.world().and_then(|world| {
            world
                .map
                .neighbors(at)
                .find(|&c| world.map.can_build_on(c) && world.map.get(c).is_some_and(|t| t.owner.is_some()))
        });
        if let Some(site) = farm_site {
            session.handle_action(
                CivId(0),
                Action::StartConstruction {
                    at: site,
                    target: ImprovementKind::Farm,
                },
            );
        }
    }

    for _ in 0..10 {
        session.advance_round();
    }

    if let Some(world) = session.world() {
        info!(
            turn = world.turn,
            cities = world.cities.len(),
            units = world.units.len(),
            traders = world.map.traders.len(),
            "demo run complete"
        );
    }

    match snapshot_session(&session).and_then(|save| write_save(&save, &save_dir, "demo")) {
        Ok(path) => info!(path = %path.display(), "demo snapshot saved"),
        Err(err) => warn!(%err, "failed to save demo snapshot"),
    }
}
