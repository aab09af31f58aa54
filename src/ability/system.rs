//! Per-tick driver for ability holders

use hecs::Entity;

use crate::ai::StateKey;
use crate::core::{Frame, GameEvent};

use super::holder::AbilityHolder;
use super::states::AbilityContext;

/// Tick every ability holder's machine.
pub fn update_abilities(frame: &mut Frame<'_>) {
    let holders: Vec<Entity> = frame
        .world
        .query::<&AbilityHolder>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();

    for caster in holders {
        let world = frame.world;
        let Some(transform) = world.transform(caster) else {
            log::warn!("ability holder {caster:?} has no transform");
            continue;
        };
        let Ok(mut holder) = world.borrow_mut::<AbilityHolder>(caster) else {
            continue;
        };
        let AbilityHolder { slot, machine } = &mut *holder;
        let mut ctx = AbilityContext {
            caster,
            transform,
            slot,
            frame: frame.reborrow(),
        };

        if let Some(transition) = machine.tick(&mut ctx) {
            log::debug!(
                "{:?} ability {} -> {}",
                caster,
                transition.from.name(),
                transition.to.name()
            );
            ctx.frame.emit(GameEvent::StateChanged {
                entity: caster,
                machine: machine.label(),
                from: transition.from.name(),
                to: transition.to.name(),
            });
        }
        machine.late_update(&mut ctx);
    }
}
