//! Headless demo: runs a scenario and logs what happens
//!
//! Usage: `wildwood-sim [scenario.ron|scenario.json] [ticks]`

use std::process::ExitCode;

use wildwood::prelude::*;

const DEFAULT_TICKS: u32 = 600;
/// Ticks between two ability uses by the demo player
const FIRE_INTERVAL: u32 = 90;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), SimError> {
    let mut args = std::env::args().skip(1);
    let scenario = match args.next() {
        Some(path) => Scenario::load(&path)?,
        None => Scenario::demo(),
    };
    let ticks = args
        .next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_TICKS);

    let mut sim = Simulation::from_scenario(&scenario)?;
    let dt = sim.config().fixed_dt;

    let player = sim
        .world
        .query::<&EntityKind>()
        .iter()
        .find(|(_, kind)| kind.is_player())
        .map(|(entity, _)| entity);

    for tick in 1..=ticks {
        if let Some(player) = player
            && let Some(transform) = sim.world.transform(player)
        {
            let eye = transform.position + Vec3::Y * 1.5;
            sim.input.set_view(Transform::looking_along(eye, Vec3::Z));
            if tick % FIRE_INTERVAL == 0 {
                sim.input.tap(InputAction::UseAbility);
            }
        }

        sim.tick(dt);

        if sim.debug.enabled {
            for line in sim.debug.summary_lines() {
                log::trace!("[{tick:>4}] cast {line}");
            }
        }

        for event in sim.events.iter() {
            match event {
                GameEvent::StateChanged {
                    entity,
                    machine,
                    from,
                    to,
                } => log::info!("[{tick:>4}] {entity:?} {machine}: {from} -> {to}"),
                GameEvent::AnimationTrigger { .. } => {}
                other => log::info!("[{tick:>4}] {other:?}"),
            }
        }
    }

    for (entity, kind) in sim.world.query::<&EntityKind>().iter() {
        let health = sim.health(entity).unwrap_or_default();
        match sim.mob_state(entity) {
            Some(state) => log::info!("{entity:?} {}: {state:?}, health {health}", kind.type_name()),
            None => log::info!("{entity:?} {}: health {health}", kind.type_name()),
        }
    }
    Ok(())
}
